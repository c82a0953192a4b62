use std::sync::Arc;

use rten_tensor::{NdTensor, NdTensorView};

use super::linalg::{add_outer, add_scaled};
use crate::config::TensorConfig;
use crate::model::SubModel;
use crate::PVec;

/// Map from a position in one mode to the stored entries at that position,
/// in compressed (CSR-like) form.
#[derive(Clone, Debug)]
struct EntryIndex {
    /// `offsets[p]..offsets[p + 1]` is the range of `entries` at position `p`.
    offsets: Vec<usize>,
    entries: Vec<usize>,
}

impl EntryIndex {
    fn build(dim: usize, coords: &[u32]) -> EntryIndex {
        let mut offsets = vec![0; dim + 1];
        for &c in coords {
            offsets[c as usize + 1] += 1;
        }
        for p in 0..dim {
            offsets[p + 1] += offsets[p];
        }

        let mut cursor = offsets.clone();
        let mut entries = vec![0; coords.len()];
        for (entry, &c) in coords.iter().enumerate() {
            let slot = &mut cursor[c as usize];
            entries[*slot] = entry;
            *slot += 1;
        }

        EntryIndex { offsets, entries }
    }

    fn at(&self, pos: usize) -> &[usize] {
        &self.entries[self.offsets[pos]..self.offsets[pos + 1]]
    }
}

/// Coordinate-list storage shared by the sparse containers.
///
/// The coordinate and value arrays are shared with the config the entries were
/// created from. An [`EntryIndex`] per mode gives each position's entries.
#[derive(Clone, Debug)]
pub struct SparseEntries {
    dims: PVec,
    nnz: usize,
    columns: Arc<Vec<u32>>,
    values: Option<Arc<Vec<f64>>>,
    index: Vec<EntryIndex>,
}

impl SparseEntries {
    /// Create entries from the stored entries of `config`.
    ///
    /// Dense configs have every cell expanded into a coordinate.
    pub fn new(config: &TensorConfig) -> SparseEntries {
        let dims = config.dims_pvec();
        let nnz = config.nnz();
        let columns = match config.columns_ptr() {
            Some(columns) => columns,
            None => {
                let mut columns = Vec::with_capacity(nnz * dims.len());
                for mode in 0..dims.len() {
                    columns.extend((0..nnz).map(|i| config.coord(mode, i) as u32));
                }
                Arc::new(columns)
            }
        };
        let index = (0..dims.len())
            .map(|mode| EntryIndex::build(dims[mode], &columns[mode * nnz..(mode + 1) * nnz]))
            .collect();

        SparseEntries {
            dims,
            nnz,
            columns,
            values: config.values_ptr(),
            index,
        }
    }

    pub fn dims(&self) -> &PVec {
        &self.dims
    }

    pub fn nnz(&self) -> usize {
        self.nnz
    }

    pub fn coord(&self, mode: usize, entry: usize) -> usize {
        self.columns[mode * self.nnz + entry] as usize
    }

    pub fn coords(&self, entry: usize) -> PVec {
        (0..self.dims.len()).map(|m| self.coord(m, entry)).collect()
    }

    pub fn value(&self, entry: usize) -> f64 {
        self.values.as_ref().map(|v| v[entry]).unwrap_or(1.0)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.nnz).map(|i| self.value(i))
    }

    /// Entries at position `pos` of `mode`.
    pub fn entries_at(&self, mode: usize, pos: usize) -> &[usize] {
        self.index[mode].at(pos)
    }

    /// Compute the elementwise product of the factor columns of every mode
    /// except `mode`, at the coordinates of `entry`.
    fn other_modes_product(
        &self,
        factors: &[NdTensorView<f64, 2>],
        mode: usize,
        entry: usize,
        out: &mut [f64],
    ) {
        out.fill(1.0);
        for (m, u) in factors.iter().enumerate() {
            if m == mode {
                continue;
            }
            let c = self.coord(m, entry);
            for (k, x) in out.iter_mut().enumerate() {
                *x *= u[[k, c]];
            }
        }
    }

    /// Add `alpha * y * v` to `rr` and, if `mm` is given, `alpha * v vᵀ` to
    /// `mm` for every entry at `pos` of `mode`, where `v` is the product of the
    /// other modes' factor columns.
    pub fn accumulate(
        &self,
        model: &SubModel,
        mode: usize,
        pos: usize,
        alpha: f64,
        rr: &mut NdTensor<f64, 1>,
        mut mm: Option<&mut NdTensor<f64, 2>>,
    ) {
        let factors: Vec<_> = (0..self.dims.len()).map(|m| model.u(m)).collect();
        let mut v = vec![0.; model.num_latent()];
        for &entry in self.entries_at(mode, pos) {
            self.other_modes_product(&factors, mode, entry, &mut v);
            add_scaled(rr, &v, alpha * self.value(entry));
            if let Some(mm) = mm.as_deref_mut() {
                add_outer(mm, &v, alpha);
            }
        }
    }

    /// Sum of `(y - prediction)^2` and of `prediction^2` over the stored
    /// entries.
    pub fn residuals(&self, model: &SubModel) -> (f64, f64) {
        let mut sumsq = 0.;
        let mut predsq = 0.;
        for entry in 0..self.nnz {
            let pred = model.predict(&self.coords(entry));
            let diff = self.value(entry) - pred;
            sumsq += diff * diff;
            predsq += pred * pred;
        }
        (sumsq, predsq)
    }
}
