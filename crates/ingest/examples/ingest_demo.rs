use std::env;

use ingest::{IngestConfig, load_image};

fn main() {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: ingest_demo <scan.bmp>");
        return;
    };

    match load_image(&path, &IngestConfig::default()) {
        Ok(raw) => {
            println!("{path}: {}x{} {:?}", raw.width(), raw.height(), raw.layout());
            println!("pixels: {} ({} bytes)", raw.pixel_count(), raw.data().len());
        }
        Err(err) => eprintln!("{path}: {err}"),
    }
}
