use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{hasher, Block};

fn bench_pow(c: &mut Criterion) {
    c.bench_function("digest", |b| {
        b.iter(|| hasher::digest(42, "alice -> bob: Rp10", 1_700_000_000.25, "000abc", 7))
    });

    c.bench_function("mine_block_difficulty_3", |b| {
        let mut index = 0u64;
        b.iter(|| {
            index += 1;
            let _mined = Block::new(index, "alice -> bob: Rp10", 1_700_000_000.25, "000abc", 3);
        });
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
