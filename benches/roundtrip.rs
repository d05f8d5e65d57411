use criterion::{criterion_group, criterion_main, Criterion};
use std::io::Cursor;
use swath::simrad::{Reader, Writer};
use swath::{Endian, RecordKind, SampleRate, Store, Timestamp};

fn survey_bytes() -> Vec<u8> {
    let mut store = Store::new();
    store.sonar = 3000;
    store.kind = RecordKind::Data;
    let ping = store.ping_mut(0);
    ping.seen.bath = true;
    ping.seen.sidescan = true;
    ping.bath.timestamp = Timestamp::new(20080505, 29570234);
    ping.bath.count = 1;
    ping.bath.serial = 345;
    ping.bath.nbeams_max = 254;
    ping.bath.nbeams = 254;
    ping.bath.depth_res = 1;
    ping.bath.distance_res = 1;
    ping.bath.sample_rate = SampleRate::Hertz(14000);
    for i in 0..254 {
        ping.bath.depth[i] = 1000 + i as i32;
        ping.bath.range[i] = 100 + i as u16;
        ping.bath.beam_num[i] = i as u8 + 1;
        ping.bath.depression[i] = 4500;
    }
    ping.sidescan.timestamp = ping.bath.timestamp;
    ping.sidescan.count = 1;
    ping.sidescan.serial = 345;
    ping.sidescan.nbeams_ss = 254;
    let mut npixels = 0;
    for i in 0..254 {
        ping.sidescan.beam_index[i] = i as u8 + 1;
        ping.sidescan.sort_direction[i] = 1;
        ping.sidescan.beam_samples[i] = 100;
        ping.sidescan.start_sample[i] = npixels;
        npixels += 100;
    }
    ping.sidescan.npixels = npixels as usize;
    let mut writer = Writer::new(Cursor::new(Vec::new()), Endian::Little);
    writer.write(&store).unwrap();
    writer.into_inner().into_inner()
}

fn bench_read(c: &mut Criterion) {
    let bytes = survey_bytes();
    c.bench_function("read survey ping", |b| {
        b.iter(|| {
            let mut reader = Reader::new(Cursor::new(bytes.as_slice()));
            while let Some(_kind) = reader.read().unwrap() {}
        })
    });
}

criterion_group!(benches, bench_read);
criterion_main!(benches);
