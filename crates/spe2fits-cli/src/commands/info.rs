use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use spe2fits_core::fits::map_metadata;
use spe2fits_core::fits::writer::render_cards;
use spe2fits_core::spe::legacy::dump_fields;
use spe2fits_core::spe::{HeaderLayout, SpeReader};

#[derive(Args)]
pub struct InfoArgs {
    /// Input SPE file
    pub file: PathBuf,

    /// List the scalar and text fields of the WinView header (arrays and spare areas are omitted)
    #[arg(long)]
    pub fields: bool,

    /// Show the FITS keyword cards the conversion would write
    #[arg(long)]
    pub cards: bool,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = SpeReader::open(&args.file)?;
    let header = &reader.header;

    println!("File:        {}", args.file.display());
    println!("Version:     {} ({})", header.version, header.header_version);
    println!("Frames:      {}", header.frame_count);
    println!("Dimensions:  {}x{}", header.width, header.height);
    println!("Pixel type:  {}", header.pixel_type);
    match header.layout {
        HeaderLayout::Legacy => {}
        HeaderLayout::Footer { offset: Some(offset) } => println!("XML footer:  at byte {}", offset),
        HeaderLayout::Footer { offset: None } => println!("XML footer:  none"),
    }

    let total_mb =
        (header.frame_byte_size() * header.frame_count as usize) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    let meta = &header.metadata;
    if let Some(exposure) = meta.exposure_time {
        println!("Exposure:    {} s", exposure);
    }
    if let Some(ref date) = meta.date_acquired {
        println!("Acquired:    {}", date);
    }
    if let Some(temperature) = meta.temperature {
        println!("Temperature: {} C", temperature);
    }
    if let Some(ref gain) = meta.gain {
        println!("Gain:        {:?}", gain);
    }
    if let Some(readout) = meta.readout_time {
        println!("Readout:     {} ms", readout);
    }
    for comment in &meta.comments {
        println!("Comment:     {}", comment);
    }
    for warning in &header.warnings {
        println!("Warning:     {}", warning);
    }

    if args.fields {
        println!();
        for (field, value) in dump_fields(reader.as_bytes())? {
            println!(
                "  {:>5}  {:<22}{:<28}{}",
                field.offset,
                field.name,
                value.to_string(),
                field.description
            );
        }
    }

    if args.cards {
        println!();
        for line in render_cards(&map_metadata(header))? {
            println!("{}", line);
        }
    }

    Ok(())
}
