//! Record write throughput against a discarding sink.

use std::io;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use llvmprof_runtime::env::MapEnv;
use llvmprof_runtime::{Filesystem, ProfileSession, RecordType, RuntimeConfig, SinkFile};

/// Filesystem whose files discard everything.
struct NullFs;

impl Filesystem for NullFs {
    fn exists(&self, _dir: &Path) -> bool {
        true
    }

    fn create_dir(&self, _dir: &Path, _mode: u32) -> io::Result<()> {
        Ok(())
    }

    fn open_append(&self, _path: &Path) -> io::Result<Box<dyn SinkFile>> {
        Ok(Box::new(io::sink()))
    }
}

fn session() -> ProfileSession {
    let session = ProfileSession::builder()
        .config(RuntimeConfig::default().with_pid_suffix(false))
        .environment(MapEnv::new())
        .filesystem(NullFs)
        .build();
    session.save_arguments(&mut vec!["bench".to_string()]);
    session.acquire_stream().unwrap();
    session
}

fn bench_word_counters(c: &mut Criterion) {
    let mut group = c.benchmark_group("word_counters");
    let session = session();

    for len in [16usize, 1024, 65536] {
        let data: Vec<u32> = (0..len as u32).collect();
        group.throughput(Throughput::Bytes((len * 4) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| {
                session
                    .write_counters(RecordType::EdgeInfo, black_box(data))
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_rank_filtered(c: &mut Criterion) {
    let session = session();
    let data = vec![1.0f64; 1024];

    c.bench_function("rank_float_counters_1024", |b| {
        b.iter(|| {
            session
                .write_rank_float_counters(RecordType::RankTimeInfo, black_box(&data), &[0])
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_word_counters, bench_rank_filtered);
criterion_main!(benches);
