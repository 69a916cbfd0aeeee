use burn_mlp::prelude::*;

type TB = burn::backend::NdArray<f32>;

fn parameters(model: &Mlp<TB>) -> Vec<(String, Vec<f32>)> {
    model
        .named_parameters()
        .into_iter()
        .map(|(name, data)| (name, data.to_vec::<f32>().unwrap()))
        .collect()
}

#[test]
fn save_then_load_is_bit_identical() {
    let device = Default::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mpk");

    for hidden in [vec![], vec![8], vec![16, 8, 4]] {
        let model: Mlp<TB> = MlpConfig::new(12, 5)
            .with_hidden_layers(hidden.clone())
            .init(&device);

        checkpoint::save(&model, &path).unwrap();
        let restored: Mlp<TB> = checkpoint::load(&path, &device).unwrap();

        assert_eq!(model.input_size(), restored.input_size());
        assert_eq!(model.output_size(), restored.output_size());
        assert_eq!(model.hidden_layers(), restored.hidden_layers());
        assert_eq!(
            parameters(&model),
            parameters(&restored),
            "hidden {hidden:?}"
        );
    }
}

#[test]
fn saving_replaces_an_existing_checkpoint() {
    let device = Default::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mpk");

    let first: Mlp<TB> = MlpConfig::new(4, 2).init(&device);
    checkpoint::save(&first, &path).unwrap();

    let second: Mlp<TB> = MlpConfig::new(4, 2).with_hidden_layers(vec![3]).init(&device);
    checkpoint::save(&second, &path).unwrap();

    let restored: Mlp<TB> = checkpoint::load(&path, &device).unwrap();
    assert_eq!(vec![3], restored.hidden_layers());
    assert_eq!(parameters(&second), parameters(&restored));
}

#[test]
fn tampered_descriptor_fails_without_partial_load() {
    let device = Default::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mpk");

    let model: Mlp<TB> = MlpConfig::new(6, 3).with_hidden_layers(vec![4]).init(&device);
    let mut snapshot = Snapshot::from_model(&model).unwrap();
    // stored values are for hidden [4]; descriptor now claims [5]
    snapshot.hidden_layers = vec![5];

    let err = snapshot.into_model::<TB>(&device).unwrap_err();
    assert!(matches!(err, MlpError::ShapeMismatch { .. }), "{err:?}");
    // nothing was ever written for the failed load
    assert!(!path.exists());
}

#[test]
fn garbage_file_is_a_decode_error() {
    let device = Default::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.mpk");
    std::fs::write(&path, b"not a checkpoint").unwrap();

    let err = checkpoint::load::<TB>(&path, &device).unwrap_err();
    assert!(matches!(err, MlpError::Decode(_)), "{err:?}");
}

#[test]
fn missing_file_is_an_io_error() {
    let device = Default::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.mpk");

    let err = checkpoint::load::<TB>(&path, &device).unwrap_err();
    assert!(matches!(err, MlpError::Io(_)), "{err:?}");
}
