use std::env;

use canonical::{NormalizeConfig, normalize};
use ingest::{IngestConfig, load_image};

fn main() {
    let mut args = env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: demo <scan.bmp> <binarized.png>");
        return;
    };

    let raw = load_image(&input, &IngestConfig::default()).expect("readable scan");
    let cfg = NormalizeConfig::default().with_parallel(true);
    let normalized = normalize(&raw, &cfg).expect("normalization succeeds");

    println!("size: {}x{}", normalized.width(), normalized.height());
    println!("levels: {:?}", normalized.levels());
    normalized
        .to_gray_image()
        .save(&output)
        .expect("output path writable");
    println!("written: {output}");
}
