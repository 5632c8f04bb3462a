use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tabula_core::arrays::chunked_array::take::TakeRandom;
use tabula_core::arrays::chunked_array::{
    Int64Chunked, PrimitiveChunkedBuilder, Utf8ChunkedBuilder,
};
use tabula_core::prelude::*;
use tabula_core::testutil::assert_series_eq;
use tabula_error::ErrorKind;

/// Build an array of random optional values split over several chunks.
fn random_chunked(rng: &mut ChaCha8Rng, chunks: usize) -> (Int64Chunked, Vec<Option<i64>>) {
    let mut expected = Vec::new();
    let mut array: Option<Int64Chunked> = None;

    for _ in 0..chunks {
        let len = rng.random_range(0..40);
        let mut builder = PrimitiveChunkedBuilder::<i64>::with_capacity("a", len);
        for _ in 0..len {
            let value = rng.random_bool(0.8).then(|| rng.random_range(-100..100));
            builder.append_option(value);
            expected.push(value);
        }

        let chunk = builder.finish();
        match array.as_mut() {
            Some(array) => array.append(&chunk).unwrap(),
            None => array = Some(chunk),
        }
    }

    (array.unwrap(), expected)
}

#[test]
fn take_matches_iteration() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..20 {
        let chunks = rng.random_range(1..5);
        let (array, expected) = random_chunked(&mut rng, chunks);

        let iterated: Vec<_> = array.iter().collect();
        assert_eq!(expected, iterated);
        assert_eq!(array.len(), array.iter().len());

        let taker = array.take_rand();
        for (idx, value) in expected.iter().enumerate() {
            assert_eq!(*value, taker.get(idx).unwrap());
            assert_eq!(*value, array.get(idx).unwrap());
        }
        assert_eq!(
            ErrorKind::OutOfBounds,
            taker.get(expected.len()).unwrap_err().kind()
        );

        let null_count = expected.iter().filter(|v| v.is_none()).count();
        assert_eq!(null_count, array.null_count());
    }
}

#[test]
fn no_null_iter_visits_every_value() {
    let mut array = Int64Chunked::from_slice("a", &[1, 2, 3]);
    array.append(&Int64Chunked::from_slice("a", &[4, 5])).unwrap();

    let values: Vec<_> = array.no_null_iter().unwrap().collect();
    assert_eq!(vec![1, 2, 3, 4, 5], values);

    let with_null = Int64Chunked::from_options("a", &[Some(1), None]);
    assert!(with_null.no_null_iter().is_none());
}

#[test]
fn builder_round_trip_with_nulls() {
    let values = [Some("a"), None, Some(""), Some("long string value"), None];
    let mut builder = Utf8ChunkedBuilder::with_capacity("s", values.len());
    for v in values {
        builder.append_option(v);
    }

    let array = builder.finish();
    assert_eq!(1, array.n_chunks());
    assert_eq!(2, array.null_count());
    assert_eq!(values.to_vec(), array.iter().collect::<Vec<_>>());
}

#[test]
fn arithmetic_propagates_nulls() {
    let a = Series::new("a", &[Some(1i32), None, Some(3), Some(4)]);
    let b = Series::new("b", &[Some(10i32), Some(20), None, Some(0)]);

    assert_series_eq(
        &Series::new("a", &[Some(11i32), None, None, Some(4)]),
        &(&a + &b).unwrap(),
    );
    assert_series_eq(
        &Series::new("a", &[Some(0i32), None, None, None]),
        &(&a / &b).unwrap(),
    );
}

#[test]
fn two_chunk_take() {
    let mut array = Int32Chunked::from_slice("a", &[1, 2, 3]);
    array.append(&Int32Chunked::from_slice("a", &[4, 5])).unwrap();
    assert_eq!(vec![3, 2], array.chunk_lengths());

    assert_eq!(Some(4), array.get(3).unwrap());
    assert_eq!(Some(4), array.take_rand().get(3).unwrap());
    assert_eq!(ErrorKind::OutOfBounds, array.get(5).unwrap_err().kind());

    let taken = array.take(&[4, 0, 3]).unwrap();
    assert_eq!(vec![Some(5), Some(1), Some(4)], taken.iter().collect::<Vec<_>>());
    assert_eq!(
        ErrorKind::OutOfBounds,
        array.take(&[1, 5]).unwrap_err().kind()
    );
}

#[test]
fn random_sort_is_ordered() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let (array, expected) = random_chunked(&mut rng, 3);

    let sorted: Vec<_> = array.sort(false).iter().collect();
    let mut values: Vec<i64> = expected.iter().flatten().copied().collect();
    values.sort();

    let nulls = expected.len() - values.len();
    let mut want: Vec<_> = values.into_iter().map(Some).collect();
    want.extend(std::iter::repeat_n(None, nulls));
    assert_eq!(want, sorted);
}
