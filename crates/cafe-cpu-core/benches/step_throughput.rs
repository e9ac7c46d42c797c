use cafe_cpu_core::{Core, GuestMemory, Interpreter};
use criterion::{criterion_group, criterion_main, Criterion};

const CODE_BASE: u32 = 0x1000;

fn bench_step(c: &mut Criterion) {
    let interp = Interpreter::new();
    let mem = GuestMemory::new(0x1_0000);

    // addi r3, r3, 1; add r4, r4, r3; b CODE_BASE
    mem.write::<u32>(CODE_BASE, 0x3863_0001);
    mem.write::<u32>(CODE_BASE + 4, 0x7c84_1a14);
    mem.write::<u32>(CODE_BASE + 8, 0x4bff_fff8);

    c.bench_function("step_loop", |b| {
        let mut core = Core::new();
        core.nia = CODE_BASE;
        b.iter(|| {
            for _ in 0..3 {
                interp.step_one(&mut core, &mem).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
