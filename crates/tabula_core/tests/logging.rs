use tabula_core::prelude::*;

#[test]
fn collect_with_test_logger() {
    logutil::init_test();

    let df = DataFrame::new(vec![Series::new("a", &[1u8, 2, 3])]).unwrap();
    let out = df
        .lazy()
        .filter(col("a").neq(lit(2u8)))
        .limit(1)
        .collect()
        .unwrap();
    assert_eq!(1, out.height());
}
