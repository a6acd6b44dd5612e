use criterion::{criterion_group, criterion_main, Criterion};
use gkrust::{construction::{genz_keister_construction, genz_keister_construction_parallel}, GenerationOptions, GenzKeister};

fn build_engine() -> GenzKeister
{
    let options = GenerationOptions{extension_levels: vec![1, 2, 6, 10], ..Default::default()};
    GenzKeister::new(options).unwrap()
}

fn assemble(gk: &GenzKeister, ndim: usize, level: usize, parallel: bool)
{
    let prec = gk.working_precision();
    let rule = if parallel
    {
        genz_keister_construction_parallel(ndim, level, gk.generators(), gk.table(), prec)
    }
    else
    {
        genz_keister_construction(ndim, level, gk.generators(), gk.table(), prec)
    };
    let _ = rule.unwrap().len();
}

fn run_case(c: &mut Criterion)
{
    let gk = build_engine();
    c.bench_function("gk_ndim4_level5", |b|b.iter(||assemble(&gk, 4, 5, false)));
    c.bench_function("gk_ndim4_level5_parallel", |b|b.iter(||assemble(&gk, 4, 5, true)));
    c.bench_function("gk_generators_1_2_6_10", |b|b.iter(build_engine));
}

criterion_group!(benches, run_case);
criterion_main!(benches);
