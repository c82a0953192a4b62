use rten_tensor::prelude::*;
use rten_tensor::{NdTensorView, NdTensorViewMut};

use super::Model;
use crate::PVec;

/// Read-only view of a rectangular region of a [`Model`].
///
/// A `SubModel` records an offset and an extent per mode. Column `j` of the
/// view's factor matrix for mode `m` is column `offset[m] + j` of the
/// underlying model. Creating a view does not copy any factor data, and the
/// view borrows the model, so it cannot outlive it.
///
/// Views can be narrowed further. The offsets of nested views add up.
///
/// Use [`SubModelMut`] to write factors of a region.
#[derive(Clone, Debug)]
pub struct SubModel<'a> {
    model: &'a Model,
    offset: PVec,
    dims: PVec,
}

impl<'a> SubModel<'a> {
    /// Create a view over the whole of `model`.
    pub fn new(model: &'a Model) -> SubModel<'a> {
        let dims = model.dims();
        SubModel {
            model,
            offset: PVec::zeros(dims.len()),
            dims,
        }
    }

    /// Narrow this view to the region starting at `start` (relative to this
    /// view) with extent `dims`.
    ///
    /// Returns `None` if the region does not fit inside this view.
    pub fn try_narrow(&self, start: &PVec, dims: &PVec) -> Option<SubModel<'a>> {
        if start.len() != self.nmodes() || dims.len() != self.nmodes() {
            return None;
        }
        let end = start + dims;
        if !end.all_le(&self.dims) {
            return None;
        }
        Some(SubModel {
            model: self.model,
            offset: &self.offset + start,
            dims: dims.clone(),
        })
    }

    /// Variant of [`try_narrow`](SubModel::try_narrow) which panics if the
    /// region is out of bounds.
    pub fn narrow(&self, start: &PVec, dims: &PVec) -> SubModel<'a> {
        self.try_narrow(start, dims).unwrap_or_else(|| {
            panic!(
                "region at {} with size {} is outside view of size {}",
                start, dims, self.dims
            )
        })
    }

    pub fn num_latent(&self) -> usize {
        self.model.num_latent()
    }

    pub fn nmodes(&self) -> usize {
        self.dims.len()
    }

    /// Extent of the view.
    pub fn dims(&self) -> &PVec {
        &self.dims
    }

    pub fn dim(&self, mode: usize) -> usize {
        self.dims[mode]
    }

    /// Offset of the view in the global model.
    pub fn offset(&self) -> &PVec {
        &self.offset
    }

    /// Factor matrix for `mode`, restricted to the columns of this view.
    pub fn u(&self, mode: usize) -> NdTensorView<'a, f64, 2> {
        let start = self.offset[mode];
        self.model
            .u(mode)
            .view()
            .slice_axis(1, start..start + self.dims[mode])
    }

    /// Predicted value at `coords`, given relative to this view.
    ///
    /// # Panics
    ///
    /// Panics if `coords` is outside the view.
    pub fn predict(&self, coords: &PVec) -> f64 {
        assert!(
            coords.all_lt(&self.dims),
            "coords {} outside view of size {}",
            coords,
            self.dims
        );
        let factors: Vec<_> = (0..self.nmodes()).map(|m| self.u(m)).collect();
        (0..self.num_latent())
            .map(|k| {
                factors
                    .iter()
                    .zip(coords.iter())
                    .map(|(u, c)| u[[k, c]])
                    .product::<f64>()
            })
            .sum()
    }
}

/// Mutable view of a rectangular region of a [`Model`].
///
/// This is the writing counterpart of [`SubModel`]. A sampler narrows it to a
/// block and writes new latent vectors through [`u_mut`](SubModelMut::u_mut)
/// using coordinates local to the block.
#[derive(Debug)]
pub struct SubModelMut<'a> {
    model: &'a mut Model,
    offset: PVec,
    dims: PVec,
}

impl<'a> SubModelMut<'a> {
    /// Create a mutable view over the whole of `model`.
    pub fn new(model: &'a mut Model) -> SubModelMut<'a> {
        let dims = model.dims();
        SubModelMut {
            offset: PVec::zeros(dims.len()),
            model,
            dims,
        }
    }

    /// Narrow this view to the region starting at `start` (relative to this
    /// view) with extent `dims`.
    ///
    /// Returns `None` if the region does not fit inside this view.
    pub fn try_narrow(self, start: &PVec, dims: &PVec) -> Option<SubModelMut<'a>> {
        let region = self.view().try_narrow(start, dims)?;
        let offset = region.offset().clone();
        Some(SubModelMut {
            model: self.model,
            offset,
            dims: dims.clone(),
        })
    }

    pub fn dims(&self) -> &PVec {
        &self.dims
    }

    pub fn offset(&self) -> &PVec {
        &self.offset
    }

    /// Read-only view of the same region.
    pub fn view(&self) -> SubModel<'_> {
        SubModel {
            model: self.model,
            offset: self.offset.clone(),
            dims: self.dims.clone(),
        }
    }

    /// Mutable factor matrix for `mode`, restricted to the columns of this
    /// view.
    pub fn u_mut(&mut self, mode: usize) -> NdTensorViewMut<'_, f64, 2> {
        let start = self.offset[mode];
        let end = start + self.dims[mode];
        self.model.u_mut(mode).slice_axis_mut(1, start..end)
    }
}

#[cfg(test)]
mod tests {
    use rten_tensor::prelude::*;

    use super::SubModelMut;
    use crate::model::Model;
    use crate::PVec;

    fn test_model() -> Model {
        let mut model = Model::zeros(1, &PVec::from([5, 3]));
        for i in 0..5 {
            model.u_mut(0)[[0, i]] = i as f64;
        }
        for j in 0..3 {
            model.u_mut(1)[[0, j]] = 10.0 * (j + 1) as f64;
        }
        model
    }

    #[test]
    fn test_narrow_translates_coords() {
        let model = test_model();
        let full = model.view();
        let sub = full.narrow(&PVec::from([2, 0]), &PVec::from([3, 3]));

        assert_eq!(sub.dims(), &PVec::from([3, 3]));
        assert_eq!(sub.offset(), &PVec::from([2, 0]));
        assert_eq!(sub.u(0).shape(), [1, 3]);
        assert_eq!(sub.u(0)[[0, 0]], 2.0);

        // Local (1, 2) is global (3, 2).
        assert_eq!(sub.predict(&PVec::from([1, 2])), model.predict(&PVec::from([3, 2])));
    }

    #[test]
    fn test_nested_narrow() {
        let model = test_model();
        let outer = model.view().narrow(&PVec::from([1, 1]), &PVec::from([4, 2]));
        let inner = outer.narrow(&PVec::from([2, 1]), &PVec::from([2, 1]));
        assert_eq!(inner.offset(), &PVec::from([3, 2]));
        assert_eq!(inner.u(1)[[0, 0]], 30.0);
    }

    #[test]
    fn test_narrow_out_of_bounds() {
        let model = test_model();
        let full = model.view();
        assert!(full.try_narrow(&PVec::from([3, 0]), &PVec::from([3, 3])).is_none());
        assert!(full.try_narrow(&PVec::from([0, 0]), &PVec::from([5])).is_none());
        assert!(full.try_narrow(&PVec::from([2, 0]), &PVec::from([3, 3])).is_some());
    }

    #[test]
    #[should_panic(expected = "outside view")]
    fn test_predict_out_of_bounds() {
        let model = test_model();
        let sub = model.view().narrow(&PVec::from([0, 0]), &PVec::from([2, 2]));
        sub.predict(&PVec::from([2, 0]));
    }

    #[test]
    fn test_write_through_narrowed_view() {
        let mut model = test_model();
        let mut sub = SubModelMut::new(&mut model)
            .try_narrow(&PVec::from([1, 1]), &PVec::from([3, 2]))
            .unwrap();
        assert_eq!(sub.offset(), &PVec::from([1, 1]));
        assert_eq!(sub.u_mut(0).shape(), [1, 3]);
        assert_eq!(sub.view().u(1)[[0, 0]], 20.0);

        // Local column 2 of mode 0 is global column 3.
        sub.u_mut(0)[[0, 2]] = -1.0;
        sub.u_mut(1)[[0, 1]] = 7.0;
        assert_eq!(sub.view().predict(&PVec::from([2, 1])), -7.0);

        assert_eq!(model.u(0)[[0, 3]], -1.0);
        assert_eq!(model.u(1)[[0, 2]], 7.0);
        assert_eq!(model.u(0)[[0, 4]], 4.0);
    }

    #[test]
    fn test_narrow_mut_out_of_bounds() {
        let mut model = test_model();
        let full = SubModelMut::new(&mut model);
        assert!(full.try_narrow(&PVec::from([4, 0]), &PVec::from([2, 3])).is_none());
    }
}
