//! Native library for reading and writing Kongsberg Simrad EM-series
//! multibeam datagram streams and Imagenex DeltaT `.83P`/`.83M` files.
//!
//! A Simrad EM stream interleaves many datagram kinds: installation and
//! runtime parameters, clock, tide, height, position, attitude and
//! heading series, sound velocity profiles, and the survey datagrams
//! proper. One acoustic ping spans several independently framed survey
//! datagrams (bathymetry, raw beam data, sidescan, with two of each on
//! dual-head sonars); the reader reassembles them into a single record
//! before handing it over.
//!
//! # Reading
//!
//! A [simrad::Reader] decodes records into its owned [Store] and reports
//! each record's [RecordKind]:
//!
//! ```no_run
//! use swath::simrad::Reader;
//! use swath::RecordKind;
//!
//! let mut reader = Reader::from_path("survey.all").unwrap();
//! while let Some(kind) = reader.read().unwrap() {
//!     if kind == RecordKind::Data {
//!         let ping = reader.store().ping(0).unwrap();
//!         println!("ping {} with {} beams", ping.bath.count, ping.bath.nbeams);
//!     }
//! }
//! ```
//!
//! # Writing
//!
//! A [simrad::Writer] frames records with either byte order and computes
//! the trailing checksums:
//!
//! ```
//! use std::io::Cursor;
//! use swath::simrad::{Reader, Writer};
//! use swath::{Endian, RecordKind, Store};
//!
//! let mut store = Store::new();
//! store.sonar = 3000;
//! store.kind = RecordKind::Clock;
//! store.clock.count = 7;
//! let mut writer = Writer::new(Cursor::new(Vec::new()), Endian::Little);
//! writer.write(&store).unwrap();
//!
//! let bytes = writer.into_inner().into_inner();
//! let mut reader = Reader::new(Cursor::new(bytes));
//! assert_eq!(Some(RecordKind::Clock), reader.read().unwrap());
//! assert_eq!(7, reader.store().clock.count);
//! ```
//!
//! The Imagenex codec lives in [deltat] with the same reader/writer
//! shape, keyed by [deltat::Format].

#![deny(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces
)]

pub mod attitude;
pub mod deltat;
pub mod geometry;
pub mod ping;
pub mod simrad;
pub mod sonar;
pub mod store;

mod codec;
mod error;
mod timestamp;

pub use codec::{Checksum, Endian};
pub use error::Error;
pub use ping::{BeamFlag, PingRecord};
pub use sonar::SonarId;
pub use store::{RecordKind, SampleRate, Store};
pub use timestamp::Timestamp;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
