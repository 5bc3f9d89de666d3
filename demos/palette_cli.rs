#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use huepick::{
    region, DominantColorPipeline, Histogram, MaxColors, PaletteController, PaletteOptions,
    PixelBuffer, RegionSize,
};

#[derive(Subcommand)]
enum Command {
    /// Print the dominant colors of the image and the palette seeded from them.
    Dominant {
        #[arg(short, long, default_value_t = MaxColors::default(), value_parser = parse_max_colors)]
        k: MaxColors,

        #[arg(long, default_value_t = huepick::DEFAULT_ALPHA_THRESHOLD)]
        alpha_threshold: u8,

        #[arg(long)]
        par: bool,
    },
    /// Print a color analysis report of the image.
    Histogram {
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Pick a color at a pixel coordinate.
    Pick {
        x: u32,

        y: u32,

        #[arg(long)]
        exact: bool,

        #[arg(long, default_value_t = RegionSize::default(), value_parser = parse_region_size)]
        size: RegionSize,
    },
}

#[derive(Parser)]
pub struct Options {
    #[arg(long)]
    verbose: bool,

    input: PathBuf,

    #[command(subcommand)]
    command: Command,
}

fn parse_max_colors(s: &str) -> Result<MaxColors, String> {
    let value: u8 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn parse_region_size(s: &str) -> Result<RegionSize, String> {
    let value: u32 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn main() {
    let Options { verbose, input, command } = Options::parse();

    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = log!("read image", image::open(&input).unwrap().into_rgba8());
    let buffer = PixelBuffer::try_from(&image).unwrap();

    match command {
        Command::Dominant { k, alpha_threshold, par } => {
            let pipeline = DominantColorPipeline::new(buffer)
                .max_colors(k)
                .alpha_threshold(alpha_threshold);

            let colors = log!(
                "dominant colors",
                if par {
                    pipeline.dominant_colors_par()
                } else {
                    pipeline.dominant_colors()
                }
            );

            println!("{}", pipeline.report(&colors));

            let mut palette = PaletteController::from_dominant(&colors, PaletteOptions::new());
            if let Some(name) = input.file_name().and_then(|name| name.to_str()) {
                palette.set_image_name(name);
            }

            println!();
            println!("{}: {}", palette.image_name(), palette.summary());
            for (i, entry) in palette.entries().iter().enumerate() {
                println!("{i}: {entry}");
            }
        }
        Command::Histogram { top } => {
            let histogram = log!(
                "histogram",
                Histogram::new(buffer, huepick::DEFAULT_ALPHA_THRESHOLD)
            );

            match histogram.stats() {
                Some(stats) => println!("{stats}"),
                None => println!("No visible pixels"),
            }

            println!();
            for entry in histogram.top(top.max(1)).unwrap() {
                println!("{entry}");
            }
        }
        Command::Pick { x, y, exact, size } => {
            let picked = log!(
                "pick",
                if exact {
                    region::pick_exact(buffer, x, y)
                } else {
                    region::pick_region(buffer, x, y, size)
                }
            );

            match picked {
                Ok(picked) => println!("{} ({})", picked.color(), picked.provenance()),
                Err(err) => eprintln!("{err}"),
            }
        }
    }
}
