//! Unit tests for per_image.rs

use std::cell::RefCell;
use std::rc::Rc;
use crate::error::Error;
use crate::renderer::per_image::PerImage;

/// Records its index into a shared log when dropped
struct DropProbe {
    index: usize,
    log: Rc<RefCell<Vec<usize>>>,
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.index);
    }
}

#[test]
fn test_build_creates_one_per_image() {
    let items = PerImage::build(3, |i| Ok(i * 10)).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2], 20);
    assert!(items.get(3).is_none());
}

#[test]
fn test_rebuild_changes_count() {
    let mut items = PerImage::build(3, |i| Ok(i)).unwrap();
    items.rebuild(5, |i| Ok(i + 100)).unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[4], 104);
}

#[test]
fn test_rebuild_drops_old_items_before_creating_new() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let created_after_drop = Rc::new(RefCell::new(Vec::new()));

    let mut items = PerImage::build(2, |index| Ok(DropProbe { index, log: log.clone() })).unwrap();
    items
        .rebuild(1, |index| {
            created_after_drop.borrow_mut().push(log.borrow().len());
            Ok(DropProbe { index: index + 10, log: log.clone() })
        })
        .unwrap();

    assert_eq!(*log.borrow(), vec![0, 1]);
    assert_eq!(*created_after_drop.borrow(), vec![2]);
}

#[test]
fn test_rebuild_failure_leaves_empty() {
    let mut items = PerImage::build(2, |i| Ok(i)).unwrap();
    let result = items.rebuild(3, |i| {
        if i == 1 {
            Err(Error::OutOfMemory)
        } else {
            Ok(i)
        }
    });

    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert!(items.is_empty());
}

#[test]
fn test_clear() {
    let mut items = PerImage::from_vec(vec![1, 2, 3]);
    items.clear();
    assert_eq!(items.len(), 0);
}

#[test]
fn test_get_mut() {
    let mut items = PerImage::from_vec(vec![1, 2]);
    *items.get_mut(1).unwrap() = 7;
    assert_eq!(items.iter().copied().collect::<Vec<_>>(), vec![1, 7]);
}
