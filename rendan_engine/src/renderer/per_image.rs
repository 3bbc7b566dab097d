/// Containers sized to the swap image count

use std::ops::Index;
use crate::error::Result;

/// One `T` per swap image
///
/// Rebuilt wholesale when the swapchain is recreated. Elements are dropped in
/// index order.
#[derive(Debug)]
pub struct PerImage<T> {
    items: Vec<T>,
}

impl<T> PerImage<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Create `count` items with `create(i)`
    pub fn build(count: usize, create: impl FnMut(usize) -> Result<T>) -> Result<Self> {
        Ok(Self { items: (0..count).map(create).collect::<Result<Vec<T>>>()? })
    }

    /// Drop the current items, then create `count` new ones
    ///
    /// On error the container is left empty.
    pub fn rebuild(&mut self, count: usize, create: impl FnMut(usize) -> Result<T>) -> Result<()> {
        self.clear();
        self.items = (0..count).map(create).collect::<Result<Vec<T>>>()?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, image_index: usize) -> Option<&T> {
        self.items.get(image_index)
    }

    pub fn get_mut(&mut self, image_index: usize) -> Option<&mut T> {
        self.items.get_mut(image_index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for PerImage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PerImage<T> {
    type Output = T;

    fn index(&self, image_index: usize) -> &T {
        &self.items[image_index]
    }
}

#[cfg(test)]
#[path = "per_image_tests.rs"]
mod tests;
