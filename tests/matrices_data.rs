//! End-to-end tests of block-composed data through the public API.

use rten_tensor::NdTensor;
use tenfac::matrix_utils::slice;
use tenfac::result::{calc_rmse, Prediction};
use tenfac::{
    Data, DataError, LayoutError, MatricesData, MatrixConfig, Model, NoiseConfig, PVec,
    TensorConfig,
};
use tenfac_testing::{assert_approx_eq, FloatRng};

fn noise() -> NoiseConfig {
    NoiseConfig::FixedGaussian { precision: 2.0 }
}

/// Block A: 2 x 3 dense matrix. Block B: 3 x 3 sparse matrix.
fn blocks() -> (MatrixConfig, MatrixConfig) {
    let a = MatrixConfig::dense(2, 3, vec![1., 2., 3., 4., 5., 6.], noise()).unwrap();
    let b = MatrixConfig::sparse(
        3,
        3,
        &[0, 1, 2, 2],
        &[0, 1, 1, 2],
        vec![7., 8., 9., 10.],
        noise(),
        true,
    )
    .unwrap();
    (a, b)
}

#[test]
fn test_stacked_blocks() {
    let (a, b) = blocks();
    let mut data = MatricesData::new();
    data.add(PVec::from([0, 0]), a.create_data()).unwrap();
    data.add(PVec::from([1, 0]), b.create_data()).unwrap();
    data.init_pre().unwrap();
    data.init_post().unwrap();

    assert_eq!(data.dim(), PVec::from([5, 3]));
    assert_eq!(data.blocks()[1].start_at(0), 2);
    assert_eq!(data.nview(0), 2);
    assert_eq!(data.nview(1), 1);
    assert_eq!(data.view(0, 4).unwrap(), 1);
    assert_eq!(data.view(0, 1).unwrap(), 0);

    assert_eq!(data.nnz(), 10);
    assert_eq!(data.nna(), 5);
    assert_eq!(data.sum(), 55.);

    let block = data.find(&PVec::from([3, 1])).unwrap();
    assert_eq!(block.pos(), &PVec::from([1, 0]));
}

#[test]
fn test_sampling_hooks() {
    let (a, b) = blocks();
    let mut data = MatricesData::new();
    data.add(PVec::from([1, 0]), b.create_data()).unwrap();
    data.add(PVec::from([0, 0]), a.create_data()).unwrap();
    data.init_pre().unwrap();
    data.init_post().unwrap();

    let mut rng = FloatRng::with_seed(99);
    let model = Model::rand(3, &data.dim(), &mut rng);
    let view = model.view();

    data.update_pnm(&view, 0).unwrap();
    data.update_pnm(&view, 1).unwrap();
    data.update(&view).unwrap();

    for mode in 0..2 {
        for pos in 0..data.dim_at(mode) {
            let mut rr = NdTensor::zeros([3]);
            let mut mm = NdTensor::zeros([3, 3]);
            data.get_mu_lambda(&view, mode, pos, &mut rr, &mut mm).unwrap();
            // The precision contribution is symmetric.
            for i in 0..3 {
                for j in 0..3 {
                    assert_approx_eq!(mm[[i, j]], mm[[j, i]], 1e-12);
                }
            }
        }
    }

    let err = data
        .get_mu_lambda(
            &view,
            0,
            5,
            &mut NdTensor::zeros([3]),
            &mut NdTensor::zeros([3, 3]),
        )
        .unwrap_err();
    assert!(matches!(err, DataError::InvariantViolated(_)));
}

#[test]
fn test_train_rmse_matches_predictions() {
    let (a, b) = blocks();
    let mut data = MatricesData::new();
    data.add(PVec::from([0, 0]), a.create_data()).unwrap();
    data.add(PVec::from([1, 0]), b.create_data()).unwrap();
    data.init_pre().unwrap();

    let mut rng = FloatRng::with_seed(7);
    let model = Model::rand(2, &data.dim(), &mut rng);

    // Predictions over the observed cells in global coordinates.
    let mut preds = Prediction::from_config(a.tensor(), false);
    for (coords, val) in b.tensor().entries() {
        let global = &coords + &PVec::from([2, 0]);
        preds.push(Prediction::new(global, val));
    }
    for pred in &mut preds {
        pred.add_model_sample(&model.view());
    }

    assert_approx_eq!(
        data.train_rmse(&model.view()).unwrap(),
        calc_rmse(&preds),
        1e-9
    );
}

#[test]
fn test_inconsistent_tiling() {
    let (a, _) = blocks();
    let wide = MatrixConfig::dense(2, 4, vec![0.; 8], noise()).unwrap();

    let mut data = MatricesData::new();
    data.add(PVec::from([0, 0]), a.create_data()).unwrap();
    data.add(PVec::from([1, 0]), wide.create_data()).unwrap();
    assert_eq!(
        data.init_pre(),
        Err(DataError::Layout(LayoutError::ExtentMismatch {
            mode: 1,
            pos: 0,
            expected: 3,
            actual: 4,
        }))
    );
}

#[test]
fn test_tensor_data_and_slice() {
    let config = TensorConfig::sparse(
        vec![2u64, 2, 3],
        vec![0u32, 1, 1, 0, 1, 1, 0, 1, 2],
        vec![1., 2., 3.],
        noise(),
    )
    .unwrap();

    let data = config.create_data().unwrap();
    assert_eq!(data.name(), "SparseTensorData");
    assert_eq!(data.nna(), 12 - 3);

    let matrix = slice(&config, [1, 2], &[(0, 1)]).unwrap();
    assert_eq!(matrix, NdTensor::from([[0., 0., 0.], [0., 2., 3.]]));
}
