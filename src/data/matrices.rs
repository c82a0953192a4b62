use std::fmt;
use std::sync::OnceLock;

use log::{debug, warn};
use rayon::prelude::*;
use rten_tensor::NdTensor;

use super::{check_model, check_mu_lambda_args, write_summary, Data, Noise};
use crate::env::env_flag;
use crate::errors::{DataError, LayoutError};
use crate::model::{SubModel, SubModelMut};
use crate::threading::thread_pool;
use crate::PVec;

/// Number of modes of a composite.
const NMODES: usize = 2;

/// Return true if composites should delegate to their blocks in parallel.
///
/// Controlled by the `TENFAC_PARALLEL_BLOCKS` environment variable.
fn parallel_blocks() -> bool {
    static PARALLEL: OnceLock<bool> = OnceLock::new();
    *PARALLEL.get_or_init(|| env_flag("TENFAC_PARALLEL_BLOCKS", true))
}

/// A data container placed at a tile of a [`MatricesData`] grid.
#[derive(Debug)]
pub struct Block {
    /// Tile index in each mode.
    pos: PVec,

    /// Global offset in each mode. Set by [`MatricesData::init_pre`].
    start: PVec,

    data: Box<dyn Data>,
}

impl Block {
    fn new(pos: PVec, data: Box<dyn Data>) -> Block {
        Block {
            start: PVec::zeros(pos.len()),
            pos,
            data,
        }
    }

    /// Tile index of the block in each mode.
    pub fn pos(&self) -> &PVec {
        &self.pos
    }

    pub fn pos_at(&self, mode: usize) -> usize {
        self.pos[mode]
    }

    /// Global coordinates of the block's first cell.
    pub fn start(&self) -> &PVec {
        &self.start
    }

    pub fn start_at(&self, mode: usize) -> usize {
        self.start[mode]
    }

    /// Global coordinates one past the block's last cell.
    pub fn end(&self) -> PVec {
        &self.start + &self.dim()
    }

    pub fn end_at(&self, mode: usize) -> usize {
        self.start[mode] + self.dim_at(mode)
    }

    /// Extent of the block's data.
    pub fn dim(&self) -> PVec {
        self.data.dim()
    }

    pub fn dim_at(&self, mode: usize) -> usize {
        self.data.dim_at(mode)
    }

    pub fn data(&self) -> &dyn Data {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> &mut dyn Data {
        self.data.as_mut()
    }

    /// Return true if the global point `p` is inside this block.
    pub fn contains(&self, p: &PVec) -> bool {
        p.in_range(&self.start, &self.end())
    }

    /// Return true if global coordinate `p` of `mode` is inside the block's
    /// range along that mode.
    pub fn contains_at(&self, mode: usize, p: usize) -> bool {
        p >= self.start_at(mode) && p < self.end_at(mode)
    }

    /// Narrow `model` to the region covered by this block.
    pub fn submodel<'a>(&self, model: &SubModel<'a>) -> Result<SubModel<'a>, DataError> {
        let dims = self.dim();
        model.try_narrow(&self.start, &dims).ok_or_else(|| {
            DataError::invariant(format!(
                "block at {} with size {} does not fit in model of size {}",
                self.start,
                dims,
                model.dims()
            ))
        })
    }

    /// Narrow a mutable `model` to the region covered by this block.
    pub fn submodel_mut<'a>(&self, model: SubModelMut<'a>) -> Result<SubModelMut<'a>, DataError> {
        let dims = self.dim();
        let model_dims = model.dims().clone();
        model.try_narrow(&self.start, &dims).ok_or_else(|| {
            DataError::invariant(format!(
                "block at {} with size {} does not fit in model of size {}",
                self.start, dims, model_dims
            ))
        })
    }
}

/// A matrix composed of blocks tiled over a grid.
///
/// Each block is an independent [`Data`] container, added at a tile position
/// with [`add`](MatricesData::add). Blocks may be added in any order. Once all
/// blocks are added, [`init_pre`](Data::init_pre) computes the global offset
/// of every tile position from the sizes of the blocks placed there. All
/// blocks at the same tile position of a mode must have the same size in that
/// mode.
///
/// ```text
///           view 0   view 1
///         +--------+------+
///  view 0 | A      | C    |   A at [0, 0], B at [1, 0], C at [0, 1]
///         +--------+------+
///  view 1 | B      |
///         +--------+
/// ```
///
/// Operations on the composite translate global positions and models into
/// the frame of each block and delegate to it.
///
/// If [`update`](Data::update) or [`update_pnm`](Data::update_pnm) fails for
/// one block, other blocks may already have been updated. The composite is
/// then in a mixed state and the run should be abandoned.
#[derive(Debug)]
pub struct MatricesData {
    blocks: Vec<Block>,

    /// Offsets of each tile position per mode. `mode_dim[m][v]` is the first
    /// global coordinate of view `v` and the last entry is the mode's size.
    mode_dim: Vec<Vec<usize>>,

    total_dim: PVec,
}

impl MatricesData {
    pub fn new() -> MatricesData {
        MatricesData {
            blocks: Vec::new(),
            mode_dim: vec![vec![0]; NMODES],
            total_dim: PVec::zeros(NMODES),
        }
    }

    /// Add a block at tile position `pos`.
    ///
    /// Returns a reference to the stored data.
    pub fn add(&mut self, pos: PVec, data: Box<dyn Data>) -> Result<&mut dyn Data, LayoutError> {
        if pos.len() != NMODES {
            return Err(LayoutError::ModeCountMismatch {
                expected: NMODES,
                actual: pos.len(),
            });
        }
        if data.nmode() != NMODES {
            return Err(LayoutError::ModeCountMismatch {
                expected: NMODES,
                actual: data.nmode(),
            });
        }
        self.blocks.push(Block::new(pos, data));
        let block = self.blocks.len() - 1;
        Ok(self.blocks[block].data_mut())
    }

    /// Blocks in the order they were added.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Offsets of the tile positions of `mode`, followed by the size of the
    /// mode.
    pub fn mode_dim(&self, mode: usize) -> &[usize] {
        &self.mode_dim[mode]
    }

    /// Number of tile positions in `mode`.
    pub fn nview(&self, mode: usize) -> usize {
        self.mode_dim[mode].len() - 1
    }

    /// Return the tile position of `mode` that contains global coordinate
    /// `pos`.
    pub fn view(&self, mode: usize, pos: usize) -> Result<usize, DataError> {
        if pos >= self.total_dim[mode] {
            return Err(DataError::invariant(format!(
                "position {} is outside mode {} of size {}",
                pos, mode, self.total_dim[mode]
            )));
        }
        let offsets = &self.mode_dim[mode];
        (0..self.nview(mode))
            .find(|&v| pos < offsets[v + 1])
            .ok_or_else(|| {
                DataError::invariant(format!("no view of mode {} contains {}", mode, pos))
            })
    }

    /// Size of view `v` of `mode`.
    pub fn view_size(&self, mode: usize, v: usize) -> usize {
        let offsets = &self.mode_dim[mode];
        offsets[v + 1] - offsets[v]
    }

    /// Return the first block that contains the global point `p`.
    pub fn find(&self, p: &PVec) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains(p))
    }

    /// Call `f` with every block whose range along `mode` contains global
    /// coordinate `pos`.
    ///
    /// Returns the number of blocks visited.
    pub fn apply<E>(
        &self,
        mode: usize,
        pos: usize,
        mut f: impl FnMut(&Block) -> Result<(), E>,
    ) -> Result<usize, E> {
        let mut count = 0;
        for block in self.blocks.iter().filter(|b| b.contains_at(mode, pos)) {
            f(block)?;
            count += 1;
        }
        Ok(count)
    }

    /// Compute the offsets of the tile positions and the start of each block.
    fn resolve_layout(&mut self) -> Result<(), LayoutError> {
        let nblocks = self.blocks.len();
        for mode in 0..NMODES {
            let mut sizes = vec![0; nblocks];
            let mut max_pos = None;
            for (i, block) in self.blocks.iter().enumerate() {
                let pos = block.pos_at(mode);
                let size = block.dim_at(mode);
                if size == 0 {
                    return Err(LayoutError::EmptyBlock { block: i, mode });
                }
                let slot = sizes
                    .get_mut(pos)
                    .ok_or(LayoutError::TilePositionOutOfRange { mode, pos })?;
                if *slot != 0 && *slot != size {
                    return Err(LayoutError::ExtentMismatch {
                        mode,
                        pos,
                        expected: *slot,
                        actual: size,
                    });
                }
                *slot = size;
                max_pos = max_pos.max(Some(pos));
            }

            let nview = max_pos.map(|p| p + 1).unwrap_or(0);
            let mut offsets = Vec::with_capacity(nview + 1);
            let mut offset = 0;
            for (pos, &size) in sizes[..nview].iter().enumerate() {
                if size == 0 {
                    warn!("tile position {} of mode {} has no blocks", pos, mode);
                }
                offsets.push(offset);
                offset += size;
            }
            offsets.push(offset);

            for block in &mut self.blocks {
                block.start[mode] = offsets[block.pos[mode]];
            }
            debug!(
                "mode {}: {} views, size {}, offsets {:?}",
                mode, nview, offset, offsets
            );
            self.total_dim[mode] = offset;
            self.mode_dim[mode] = offsets;
        }
        Ok(())
    }

    /// Call `op` on every block with the model narrowed to the block.
    ///
    /// Stops at the first error. Blocks visited before it keep their
    /// changes, and with parallel delegation blocks visited after it may
    /// also have run.
    fn for_each_block(
        &mut self,
        model: &SubModel,
        op: &(dyn Fn(&mut dyn Data, &SubModel) -> Result<(), DataError> + Sync),
    ) -> Result<(), DataError> {
        check_model(model, &self.total_dim)?;
        let run_block = |block: &mut Block| {
            let sub = block.submodel(model)?;
            op(block.data_mut(), &sub)
        };

        if parallel_blocks() && self.blocks.len() > 1 {
            debug!("updating {} blocks in parallel", self.blocks.len());
            let blocks = &mut self.blocks;
            thread_pool().run(|| blocks.par_iter_mut().try_for_each(run_block))
        } else {
            self.blocks.iter_mut().try_for_each(run_block)
        }
    }
}

impl Default for MatricesData {
    fn default() -> Self {
        Self::new()
    }
}

impl Data for MatricesData {
    fn name(&self) -> &str {
        "MatricesData"
    }

    fn init_pre(&mut self) -> Result<(), DataError> {
        // Blocks may be composites whose size is only known after their own
        // layout is resolved.
        for block in &mut self.blocks {
            block.data.init_pre()?;
        }
        self.resolve_layout()?;
        Ok(())
    }

    fn init_post(&mut self) -> Result<(), DataError> {
        for block in &mut self.blocks {
            block.data.init_post()?;
        }
        Ok(())
    }

    fn dim(&self) -> PVec {
        self.total_dim.clone()
    }

    fn nnz(&self) -> u64 {
        self.blocks.iter().map(|b| b.data.nnz()).sum()
    }

    fn nna(&self) -> u64 {
        self.blocks.iter().map(|b| b.data.nna()).sum()
    }

    fn sum(&self) -> f64 {
        self.blocks.iter().map(|b| b.data.sum()).sum()
    }

    fn sumsq(&self, _model: &SubModel) -> Result<f64, DataError> {
        Err(DataError::NotImplemented("MatricesData::sumsq"))
    }

    fn var_total(&self) -> f64 {
        f64::NAN
    }

    fn train_rmse(&self, model: &SubModel) -> Result<f64, DataError> {
        check_model(model, &self.total_dim)?;
        let mut sum = 0.;
        let mut total_obs = 0;
        for block in &self.blocks {
            let nobs = block.data.size() - block.data.nna();
            if nobs == 0 {
                continue;
            }
            let rmse = block.data.train_rmse(&block.submodel(model)?)?;
            sum += rmse * rmse * nobs as f64;
            total_obs += nobs;
        }
        if total_obs == 0 {
            return Err(DataError::invariant("data has no observed cells"));
        }
        Ok((sum / total_obs as f64).sqrt())
    }

    fn update(&mut self, model: &SubModel) -> Result<(), DataError> {
        self.for_each_block(model, &|data, sub| data.update(sub))
    }

    fn update_pnm(&mut self, model: &SubModel, mode: usize) -> Result<(), DataError> {
        self.for_each_block(model, &|data, sub| data.update_pnm(sub, mode))
    }

    fn get_mu_lambda(
        &self,
        model: &SubModel,
        mode: usize,
        pos: usize,
        rr: &mut NdTensor<f64, 1>,
        mm: &mut NdTensor<f64, 2>,
    ) -> Result<(), DataError> {
        check_model(model, &self.total_dim)?;
        check_mu_lambda_args(&self.total_dim, model.num_latent(), mode, pos, rr, mm)?;

        let count = self.apply(mode, pos, |block| {
            let sub = block.submodel(model)?;
            block
                .data
                .get_mu_lambda(&sub, mode, pos - block.start_at(mode), rr, mm)
        })?;
        if count == 0 {
            return Err(DataError::invariant(format!(
                "no block contains position {} of mode {}",
                pos, mode
            )));
        }
        Ok(())
    }

    fn noise(&self) -> Option<&Noise> {
        None
    }

    fn noise_mut(&mut self) -> Option<&mut Noise> {
        None
    }

    fn info(&self, out: &mut dyn fmt::Write, indent: &str) -> fmt::Result {
        write_summary(self, out, indent)?;
        writeln!(out, "{}Sub-Matrices:", indent)?;
        let block_indent = format!("{}  ", indent);
        for block in &self.blocks {
            writeln!(out, "{}{}:", indent, block.pos)?;
            block.data.info(out, &block_indent)?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn status(&self, out: &mut dyn fmt::Write, indent: &str) -> fmt::Result {
        writeln!(out, "{}Sub-Matrices:", indent)?;
        let nested_indent = format!("{}    ", indent);
        for block in &self.blocks {
            match block.data.noise() {
                Some(noise) => writeln!(out, "{}  {}: {}", indent, block.pos, noise.status())?,
                None => {
                    writeln!(out, "{}  {}:", indent, block.pos)?;
                    block.data.status(out, &nested_indent)?;
                }
            }
        }
        Ok(())
    }
}
