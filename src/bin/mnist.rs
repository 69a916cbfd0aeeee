//! Tutorial flow end to end: train a feed-forward classifier on MNIST,
//! checkpoint it, reload the checkpoint, and evaluate on the test split.

use burn::data::dataset::vision::{MnistDataset, MnistItem};
use burn::data::dataset::{Dataset, InMemDataset};
use burn::module::AutodiffModule;
use burn::optim::SgdConfig;
use burn::prelude::*;
use burn_mlp::prelude::*;
use std::path::PathBuf;

type MainBackend = burn::backend::NdArray<f32>;
type MainAutoBackend = burn::backend::Autodiff<MainBackend>;

pub const HELP: &str = "\
burn-mlp MNIST demo

Trains a multilayer perceptron on MNIST digits, saves a checkpoint, reloads
it, and reports accuracy on the test split. The dataset is downloaded to the
burn-dataset cache directory on first use.

USAGE:
    mnist [OPTIONS]

FLAGS:
    -h, --help                 Show this help message and exit

OPTIONS:
    -e, --epochs <N>           Number of training epochs [default: 4]
    -b, --batch-size <N>       Batch size [default: 32]
    -l, --lr <F>               Learning rate [default: 0.1]
    -s, --seed <N>             Backend and shuffle seed [default: 0]
    -d, --hidden <LIST>        Comma-separated hidden layer widths [default: 128,64]
    -a, --artifacts-path <PATH>
                               Directory for configs and the checkpoint
                               [default: /tmp/burn-mlp/mnist]
";

#[derive(Debug)]
struct AppArgs {
    epochs: usize,
    batch_size: usize,
    lr: f64,
    seed: u64,
    hidden: Vec<usize>,
    artifacts_path: PathBuf,
}

impl AppArgs {
    fn parse() -> Result<Self, pico_args::Error> {
        let mut pargs = pico_args::Arguments::from_env();

        if pargs.contains(["-h", "--help"]) {
            println!("{HELP}");
            std::process::exit(0);
        }

        let args = AppArgs {
            epochs: pargs.opt_value_from_str(["-e", "--epochs"])?.unwrap_or(4),
            batch_size: pargs
                .opt_value_from_str(["-b", "--batch-size"])?
                .unwrap_or(32),
            lr: pargs.opt_value_from_str(["-l", "--lr"])?.unwrap_or(0.1),
            seed: pargs.opt_value_from_str(["-s", "--seed"])?.unwrap_or(0),
            hidden: pargs
                .opt_value_from_fn(["-d", "--hidden"], parse_hidden)?
                .unwrap_or_else(|| vec![128, 64]),
            artifacts_path: pargs
                .opt_value_from_os_str(["-a", "--artifacts-path"], parse_path)?
                .unwrap_or_else(|| PathBuf::from("/tmp/burn-mlp/mnist")),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            panic!("unused arguments: {remaining:?}");
        }

        Ok(args)
    }
}

fn parse_hidden(s: &str) -> Result<Vec<usize>, String> {
    s.split(',')
        .filter(|part| !part.is_empty())
        .map(|part| part.trim().parse::<usize>().map_err(|err| err.to_string()))
        .collect()
}

fn parse_path(s: &std::ffi::OsStr) -> Result<PathBuf, &'static str> {
    Ok(s.into())
}

/// Flattens one 28x28 image into the normalized feature vector the model
/// consumes. Mean/std are the PyTorch MNIST example constants.
fn flatten(item: MnistItem) -> VectorItem {
    let features = item
        .image
        .iter()
        .flatten()
        .map(|&brightness| ((brightness / 255.0) - 0.1307) / 0.3081)
        .collect();

    VectorItem {
        features,
        label: item.label,
    }
}

fn load_split(dataset: MnistDataset) -> InMemDataset<VectorItem> {
    InMemDataset::new(dataset.iter().map(flatten).collect())
}

fn main() -> Result<(), MlpError> {
    env_logger::init();
    let args = AppArgs::parse().expect("failed to parse arguments");
    std::fs::create_dir_all(&args.artifacts_path)?;

    let model_config = MlpConfig::new(28 * 28, 10).with_hidden_layers(args.hidden.clone());
    let training_config = TrainingConfig::new(SgdConfig::new())
        .with_num_epochs(args.epochs)
        .with_batch_size(args.batch_size)
        .with_lr(args.lr)
        .with_seed(args.seed);

    model_config
        .save(args.artifacts_path.join("model_config.json"))
        .expect("failed to save the model config");
    training_config
        .save(args.artifacts_path.join("training_config.json"))
        .expect("failed to save the training config");

    println!("loading MNIST...");
    let train_split = load_split(MnistDataset::train());
    let test_split = load_split(MnistDataset::test());

    println!(
        "training {:?} for {} epochs (batch size {}, lr {})...",
        args.hidden, args.epochs, args.batch_size, args.lr
    );
    let device = Default::default();
    let outcome = train::<MainAutoBackend, _>(&training_config, &model_config, train_split, device)?;
    for (epoch, loss) in outcome.epoch_losses.iter().enumerate() {
        println!("epoch {}: mean loss {loss:.4}", epoch + 1);
    }

    let checkpoint_path = args.artifacts_path.join("model.mpk");
    checkpoint::save(&outcome.model.valid(), &checkpoint_path)?;
    println!("checkpoint written to {checkpoint_path:?}");

    // reload from disk to prove the round trip before evaluating
    let device = Default::default();
    let model: Mlp<MainBackend> = checkpoint::load(&checkpoint_path, &device)?;
    let eval = evaluate(&model, test_split, args.batch_size, device)?;
    println!(
        "test split: mean loss {:.4}, accuracy {:.2}%",
        eval.mean_loss,
        eval.accuracy * 100.0
    );

    Ok(())
}
