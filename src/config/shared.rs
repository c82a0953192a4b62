use std::sync::Arc;

/// Conversion of a raw input array into the shared storage used by
/// configurations.
///
/// This lets constructors accept the array by copy (`&[T]`), by move
/// (`Vec<T>`) or by sharing an existing reference-counted buffer
/// (`Arc<Vec<T>>`).
pub trait IntoShared<T> {
    fn into_shared(self) -> Arc<Vec<T>>;
}

impl<T: Clone> IntoShared<T> for &[T] {
    fn into_shared(self) -> Arc<Vec<T>> {
        Arc::new(self.to_vec())
    }
}

impl<T: Clone, const N: usize> IntoShared<T> for &[T; N] {
    fn into_shared(self) -> Arc<Vec<T>> {
        Arc::new(self.to_vec())
    }
}

impl<T: Clone> IntoShared<T> for &Vec<T> {
    fn into_shared(self) -> Arc<Vec<T>> {
        Arc::new(self.clone())
    }
}

impl<T> IntoShared<T> for Vec<T> {
    fn into_shared(self) -> Arc<Vec<T>> {
        Arc::new(self)
    }
}

impl<T> IntoShared<T> for Arc<Vec<T>> {
    fn into_shared(self) -> Arc<Vec<T>> {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::IntoShared;

    #[test]
    fn test_shared_input_is_not_copied() {
        let data = Arc::new(vec![1.0, 2.0]);
        let shared = Arc::clone(&data).into_shared();
        assert!(Arc::ptr_eq(&data, &shared));
    }

    #[test]
    fn test_copied_and_moved_inputs() {
        let values = [1u32, 2, 3];
        assert_eq!(*values.as_slice().into_shared(), vec![1, 2, 3]);
        assert_eq!(*(&values).into_shared(), vec![1, 2, 3]);
        assert_eq!(*values.to_vec().into_shared(), vec![1, 2, 3]);
    }
}
