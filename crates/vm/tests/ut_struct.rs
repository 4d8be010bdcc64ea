//! Struct tests: deep clone, depth limits and value equality.

use num_bigint::BigInt;
use onyx_vm::{
    Array, StackItem, Struct, VmError, VmLimits, MAX_COMPARABLE_ITEMS, MAX_STRUCT_DEPTH,
};
use proptest::prelude::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A struct whose innermost struct sits `depth` levels below the root.
fn create_deep_struct(depth: usize) -> Struct {
    let mut result = Struct::new(vec![StackItem::from_int(BigInt::from(1))]);
    for _ in 0..depth {
        result = Struct::new(vec![StackItem::Struct(result)]);
    }
    result
}

/// A struct holding `width` handles to one shared child, `depth` levels deep.
fn wide_chain(width: usize, depth: usize) -> Struct {
    let mut current = Struct::new(vec![StackItem::from_int(1)]);
    for _ in 0..depth {
        let items = (0..width).map(|_| StackItem::Struct(current.clone())).collect();
        current = Struct::new(items);
    }
    current
}

#[test]
fn test_struct_clone() {
    let s1 = Struct::new(vec![
        StackItem::from_int(1),
        StackItem::from_struct(vec![StackItem::from_int(2)]),
    ]);

    let s2 = s1.deep_clone().unwrap();
    assert!(StackItem::Struct(s1.clone()).equals(&StackItem::Struct(s2.clone())));

    s1.set(0, StackItem::from_int(3)).unwrap();
    s1.get(1)
        .unwrap()
        .as_struct()
        .unwrap()
        .set(0, StackItem::from_int(4))
        .unwrap();

    assert_eq!(s2.get(0).unwrap(), StackItem::from_int(1));
    assert_eq!(
        s2.get(1).unwrap().get_struct().unwrap(),
        vec![StackItem::from_int(2)]
    );
}

#[test]
fn test_struct_clone_mutating_copy_leaves_original() {
    let original = Struct::new(vec![StackItem::from_int(1), StackItem::from_bool(true)]);
    let copy = original.deep_clone().unwrap();

    copy.set(1, StackItem::from_bool(false)).unwrap();
    copy.add(StackItem::from_int(9));

    assert_eq!(original.len(), 2);
    assert_eq!(original.get(1).unwrap(), StackItem::from_bool(true));
    assert!(!StackItem::Struct(original).equals(&StackItem::Struct(copy)));
}

#[test]
fn test_struct_clone_below_depth_limit() {
    let deep = create_deep_struct(MAX_STRUCT_DEPTH - 2);
    let copy = deep.deep_clone().unwrap();

    assert!(StackItem::Struct(deep.clone()).equals(&StackItem::Struct(copy.clone())));
    assert!(!deep.ptr_eq(&copy));
}

#[test]
fn test_struct_clone_depth_limit() {
    init_logger();
    for depth in [MAX_STRUCT_DEPTH, MAX_STRUCT_DEPTH + 1, 2048] {
        let deep = create_deep_struct(depth);
        assert_eq!(
            deep.deep_clone().unwrap_err(),
            VmError::DepthExceeded {
                limit: MAX_STRUCT_DEPTH
            }
        );
    }
}

#[test]
fn test_struct_clone_custom_depth() {
    let limits = VmLimits::DEFAULT.with_max_struct_depth(3);

    assert!(create_deep_struct(2).clone_with_limits(&limits).is_ok());
    assert!(create_deep_struct(3).clone_with_limits(&limits).is_err());
    assert!(create_deep_struct(3).deep_clone().is_ok());
}

#[test]
fn test_struct_clone_keeps_interop_and_array_identity() {
    let array = Array::new(vec![StackItem::from_int(5)]);
    let original = Struct::new(vec![StackItem::Array(array.clone())]);
    let copy = original.deep_clone().unwrap();

    array.add(StackItem::from_int(6));
    assert_eq!(copy.get(0).unwrap().count(), 2);
}

#[test]
fn test_struct_equals() {
    let s1 = StackItem::from_struct(vec![
        StackItem::from_int(1),
        StackItem::from_byte_array(vec![0x01, 0x02]),
    ]);
    let s2 = StackItem::from_struct(vec![
        StackItem::from_int(1),
        StackItem::from_byte_array(vec![0x01, 0x02]),
    ]);
    let s3 = StackItem::from_struct(vec![
        StackItem::from_int(2),
        StackItem::from_byte_array(vec![0x01, 0x02]),
    ]);

    assert_eq!(s1, s2);
    assert_ne!(s1, s3);
    assert_ne!(s1, StackItem::from_struct(vec![StackItem::from_int(1)]));
}

#[test]
fn test_struct_equals_with_nesting() {
    let nested = |value: i64| {
        StackItem::from_struct(vec![StackItem::from_struct(vec![StackItem::from_int(value)])])
    };

    assert_eq!(nested(1), nested(1));
    assert_ne!(nested(1), nested(2));
}

#[test]
fn test_struct_equals_depth_limit() {
    init_logger();
    let a = StackItem::Struct(create_deep_struct(MAX_STRUCT_DEPTH));
    let b = StackItem::Struct(create_deep_struct(MAX_STRUCT_DEPTH));

    assert!(!a.equals(&b));
    assert_eq!(
        a.equals_with_limits(&b, &VmLimits::DEFAULT),
        Err(VmError::DepthExceeded {
            limit: MAX_STRUCT_DEPTH
        })
    );
    assert!(a
        .equals_with_limits(&b, &VmLimits::DEFAULT.with_max_struct_depth(MAX_STRUCT_DEPTH + 1))
        .unwrap());
}

#[test]
fn test_cyclic_structs() {
    let a = Struct::new(vec![StackItem::from_int(1)]);
    a.add(StackItem::Struct(a.clone()));
    let b = Struct::new(vec![StackItem::from_int(1)]);
    b.add(StackItem::Struct(b.clone()));

    assert!(StackItem::Struct(a.clone()).equals(&StackItem::Struct(a.clone())));
    assert!(!StackItem::Struct(a.clone()).equals(&StackItem::Struct(b.clone())));
    assert!(matches!(a.deep_clone(), Err(VmError::DepthExceeded { .. })));

    a.clear();
    b.clear();
}

#[test]
fn test_struct_equals_wide_dag_is_bounded() {
    init_logger();
    let a = StackItem::Struct(wide_chain(20, 8));
    let b = StackItem::Struct(wide_chain(20, 8));

    assert_eq!(
        a.equals_with_limits(&b, &VmLimits::DEFAULT),
        Err(VmError::ItemLimitExceeded {
            limit: MAX_COMPARABLE_ITEMS
        })
    );
    assert!(!a.equals(&b));
    assert!(a.equals(&a.clone()));
}

#[test]
fn test_struct_equals_small_dag_within_budget() {
    let a = StackItem::Struct(wide_chain(2, 3));
    let b = StackItem::Struct(wide_chain(2, 3));

    assert!(a.equals_with_limits(&b, &VmLimits::DEFAULT).unwrap());

    let tight = VmLimits {
        max_comparable_items: 13,
        ..VmLimits::DEFAULT
    };
    assert_eq!(
        a.equals_with_limits(&b, &tight),
        Err(VmError::ItemLimitExceeded { limit: 13 })
    );
}

#[test]
fn test_drop_deep_struct() {
    let mut current = Struct::default();
    for _ in 0..1_000_000 {
        current = Struct::new(vec![StackItem::Struct(current)]);
    }
    drop(current);
}

fn flat_struct() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(any::<i64>(), 0..32)
}

proptest! {
    #[test]
    fn prop_clone_equals_original(values in flat_struct()) {
        let original = Struct::new(values.iter().map(|v| StackItem::from_int(*v)).collect());
        let copy = original.deep_clone().unwrap();

        prop_assert!(StackItem::Struct(original.clone()).equals(&StackItem::Struct(copy.clone())));
        prop_assert_eq!(copy.len(), values.len());

        if !values.is_empty() {
            copy.set(0, StackItem::from_byte_array(vec![0xAA])).unwrap();
            prop_assert_eq!(original.get(0).unwrap(), StackItem::from_int(values[0]));
        }
    }

    #[test]
    fn prop_count_after_adds(n in 0usize..64) {
        let structure = Struct::default();
        for i in 0..n {
            structure.add(StackItem::from_int(i as i64));
        }
        prop_assert_eq!(structure.count(), n);
        prop_assert_eq!(StackItem::Struct(structure).count(), n);
    }

    #[test]
    fn prop_remove_at_preserves_order(len in 1usize..32, seed in any::<usize>()) {
        let index = seed % len;
        let values: Vec<i64> = (0..len as i64).collect();
        let structure = Struct::new(values.iter().map(|v| StackItem::from_int(*v)).collect());

        let removed = structure.remove_at(index).unwrap();
        prop_assert_eq!(removed, StackItem::from_int(values[index]));
        prop_assert_eq!(structure.count(), len - 1);

        let mut expected = values.clone();
        expected.remove(index);
        let expected: Vec<StackItem> = expected.into_iter().map(StackItem::from_int).collect();
        prop_assert_eq!(structure.items(), expected);
    }
}
