use gkrust::{accuracy::check_accuracy, build_rule, construction::{genz_keister_construction, genz_keister_construction_parallel},
    generators::compute_generators, is_accurate_enough, CertifiedReal, GKError, GenerationOptions, GenzKeister,
    PolynomialFamily, QuadratureRule, SerializationFormat};

const NINE_POINT_LEVELS: [usize; 3] = [1, 2, 6];

fn nine_point_engine() -> GenzKeister
{
    let options = GenerationOptions{extension_levels: NINE_POINT_LEVELS.to_vec(), ..Default::default()};
    GenzKeister::new(options).unwrap()
}

fn assert_close(actual: f64, expected: f64, tol: f64)
{
    assert!((actual - expected).abs() <= tol * expected.abs().max(1.0), "{actual} != {expected}");
}

fn moment(rule: &QuadratureRule, dim: usize, power: i32) -> f64
{
    rule.integrate(|x| x[dim].powi(power))
}

#[test]
fn nine_point_generators()
{
    let gk = nine_point_engine();
    let expected = [0.0, 1.7320508075688772, 4.184956017672732, 0.7410953499945409, 2.861279576057058];
    let generators = gk.generators().to_f64();
    assert_eq!(generators.len(), expected.len());
    for (g, e) in generators.iter().zip(expected)
    {
        assert_close(*g, e, 1e-14);
    }
    assert_eq!(gk.generators().extension_levels(), NINE_POINT_LEVELS.to_vec());
    assert!(gk.generators().iter().all(|g| g.radius_below_2exp(-100)));
}

#[test]
fn generators_alternate_within_each_block()
{
    let generators = compute_generators(PolynomialFamily::HermiteProbabilist.backend(), &[1, 2, 6, 10], 128).unwrap();
    let mut start = 0;
    for &(_, len) in generators.blocks()
    {
        let block: Vec<f64> = generators.as_slice()[start..start + len].iter().map(CertifiedReal::to_f64).collect();
        for i in 2..block.len()
        {
            if i % 2 == 0
            {
                assert!(block[i] <= block[i - 2]);
            }
            else
            {
                assert!(block[i] >= block[i - 2]);
            }
        }
        start += len;
    }
    assert_eq!(start, 10);
}

#[test]
fn one_dimensional_rule_sizes()
{
    let mut gk = nine_point_engine();
    let sizes: Vec<usize> = (0..=4).map(|level| gk.rule(1, level).unwrap().len()).collect();
    assert_eq!(sizes, vec![1, 3, 3, 7, 9]);
}

#[test]
fn weights_sum_to_total_mass()
{
    let mut gk = nine_point_engine();
    for (ndim, max_level) in [(1, 4), (2, 4), (3, 3)]
    {
        for level in 0..=max_level
        {
            let rule = gk.rule(ndim, level).unwrap();
            let sum = rule.weight_sum(128);
            assert_close(sum.to_f64(), 1.0, 1e-14);
            assert!(sum.overlaps(&CertifiedReal::one()), "level {level} mass {sum:?} excludes 1");
            assert!(check_accuracy(&sum, 64));
            if level > 0
            {
                assert_close(moment(rule, 0, 2), 1.0, 1e-13);
                assert_close(moment(rule, ndim - 1, 2), 1.0, 1e-13);
            }
        }
    }
}

#[test]
fn nine_point_rule_integrates_higher_moments()
{
    let mut gk = nine_point_engine();
    let rule = gk.rule(1, 4).unwrap();
    assert_close(moment(rule, 0, 4), 3.0, 1e-12);
    assert_close(moment(rule, 0, 6), 15.0, 1e-12);
    assert_close(moment(rule, 0, 3), 0.0, 1e-12);
    assert!(rule.weights().iter().all(CertifiedReal::is_positive));
}

#[test]
fn three_point_rule()
{
    let rule = build_rule(1, 1, PolynomialFamily::HermiteProbabilist, &[1, 2], 128).unwrap();
    let (nodes, weights) = rule.to_f64();
    assert_eq!(nodes.len(), 3);
    assert_close(nodes[0], 0.0, 0.0);
    assert_close(nodes[1], 3.0_f64.sqrt(), 1e-15);
    assert_close(nodes[2], -(3.0_f64.sqrt()), 1e-15);
    assert_close(weights[0], 2.0 / 3.0, 1e-15);
    assert_close(weights[1], 1.0 / 6.0, 1e-15);
    assert_close(weights[2], 1.0 / 6.0, 1e-15);
    assert!(is_accurate_enough(&rule, 100));
}

#[test]
fn two_dimensional_level_one()
{
    let rule = build_rule(2, 1, PolynomialFamily::HermiteProbabilist, &[1, 2], 128).unwrap();
    assert_eq!(rule.len(), 5);
    let weights = rule.weights_f64();
    assert_close(weights[0], 1.0 / 3.0, 1e-15);
    for w in &weights[1..]
    {
        assert_close(*w, 1.0 / 6.0, 1e-15);
    }
    assert!(rule.node(0).iter().all(CertifiedReal::mid_is_zero));
    for node in rule.nodes().skip(1)
    {
        assert_eq!(node.iter().filter(|c| c.mid_is_zero()).count(), 1);
    }
}

#[test]
fn legendre_three_point_rule()
{
    let rule = build_rule(1, 1, PolynomialFamily::Legendre, &[1, 2], 128).unwrap();
    let weights = rule.weights_f64();
    assert_close(weights[0], 4.0 / 9.0, 1e-15);
    assert_close(weights[1], 5.0 / 18.0, 1e-15);
    assert_close(rule.node(1)[0].to_f64(), 0.6_f64.sqrt(), 1e-15);
    assert_close(moment(&rule, 0, 2), 1.0 / 3.0, 1e-14);
}

#[test]
fn laguerre_is_rejected()
{
    assert_eq!(build_rule(1, 1, PolynomialFamily::Laguerre, &[1, 2], 64),
        Err(GKError::UnsupportedFamily(PolynomialFamily::Laguerre)));
}

#[test]
fn boundary_cases()
{
    let rule = build_rule(0, 3, PolynomialFamily::HermiteProbabilist, &[1, 2], 64).unwrap();
    assert_eq!(rule.len(), 1);
    assert_eq!(rule.ndim(), 0);
    assert_eq!(rule.weights()[0], CertifiedReal::one());

    let rule = build_rule(3, 0, PolynomialFamily::HermiteProbabilist, &[1, 2], 64).unwrap();
    assert_eq!(rule.len(), 1);
    assert!(rule.node(0).iter().all(CertifiedReal::mid_is_zero));
    assert_close(rule.weights()[0].to_f64(), 1.0, 0.0);
}

#[test]
fn construction_is_deterministic()
{
    let gk = nine_point_engine();
    let prec = gk.working_precision();
    let first = genz_keister_construction(3, 4, gk.generators(), gk.table(), prec).unwrap();
    let second = genz_keister_construction(3, 4, gk.generators(), gk.table(), prec).unwrap();
    let parallel = genz_keister_construction_parallel(3, 4, gk.generators(), gk.table(), prec).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, parallel);
}

#[test]
fn parallel_option_gives_same_rule()
{
    let mut serial = nine_point_engine();
    let options = GenerationOptions{extension_levels: NINE_POINT_LEVELS.to_vec(), parallel: true, ..Default::default()};
    let mut parallel = GenzKeister::new(options).unwrap();
    assert_eq!(serial.rule(2, 4).unwrap(), parallel.rule(2, 4).unwrap());
}

#[test]
fn certified_rule_meets_target()
{
    let options = GenerationOptions{extension_levels: NINE_POINT_LEVELS.to_vec(), working_precision: 64, target_precision: 80, ..Default::default()};
    let mut gk = GenzKeister::new(options).unwrap();
    let rule = gk.certified_rule(2, 3).unwrap();
    assert!(is_accurate_enough(&rule, 80));
    assert!(gk.working_precision() >= 128);
}

#[test]
fn persisted_rule_roundtrip()
{
    let mut gk = nine_point_engine();
    let rule = gk.rule(2, 2).unwrap().clone();
    for format in [SerializationFormat::Json, SerializationFormat::BincodeLz4]
    {
        let bytes = rule.write_buffer(format).unwrap();
        assert_eq!(QuadratureRule::read_buffer(&bytes, format).unwrap(), rule);
    }
    let bytes = gkrust::serialization::serialize(&gk, SerializationFormat::Json).unwrap();
    let restored: GenzKeister = gkrust::serialization::deserialize(&bytes, SerializationFormat::Json).unwrap();
    assert_eq!(restored.generators(), gk.generators());
    assert_eq!(restored.table(), gk.table());
}
