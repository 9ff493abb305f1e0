//! Acquisition file inspection utility
//! Sniffs the file format and prints the decoded header sections

use std::env;
use std::fs;

use dpet_rs::formats::{dpet, header, scan, ParseOptions};
use dpet_rs::{Body, DataSet, Device, FileKind};
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <file>", args[0]);
        eprintln!("Example: {} scan.dpet", args[0]);
        eprintln!("\nAccepts both container files and native acquisition files;");
        eprintln!("only the header sections are decoded.");
        std::process::exit(1);
    }

    let path = &args[1];
    let buf = fs::read(path)?;
    println!("File: {} ({} bytes)", path, buf.len());

    if buf.starts_with(&header::MAGIC) {
        dump_container(&buf)?;
    } else {
        dump_scan(&buf)?;
    }
    Ok(())
}

fn kind_name(code: u16) -> String {
    match FileKind::from_code(code) {
        Some(kind) => format!("{} ({})", code, kind),
        None => format!("{} (unknown)", code),
    }
}

fn dump_container(buf: &[u8]) -> anyhow::Result<()> {
    let dataset = dpet::read(buf, ParseOptions::new().only_header())?;
    let content = &dataset.header.content;

    println!("Format: container");
    println!("\n=== Public ===");
    println!("  File type:       {}", kind_name(content.public.file_type));
    println!("  Transfer syntax: {:?}", content.public.transfer_syntax);
    if !content.public.md5.is_empty() {
        println!("  MD5:             {}", content.public.md5);
    }

    println!("\n=== Scanner ===");
    println!("  Device:          {}", content.scanner.device);
    println!("  Serial:          {}", content.scanner.serial);
    println!("  Rings:           {}", content.scanner.detector_rings);
    println!("  Channels:        {}", content.scanner.detector_channels);
    match Device::parse(&content.scanner.device) {
        Some(device) => println!("  Family:          {:?}", device),
        None => println!("  Family:          unrecognized"),
    }

    if let Some(acq) = &content.acquisition {
        println!("\n=== Acquisition ===");
        println!("  Isotope:         {}", acq.isotope);
        println!("  Duration:        {} s", acq.duration);
        println!("  Energy window:   {:?}", acq.energy_window);
        println!("  Patient ID:      {}", acq.patient_id);
        println!("  Study ID:        {}", acq.study_id);
    }
    if let Some(image) = &content.image {
        println!("\n=== Image ===");
        println!("  Size:            {}x{}x{}", image.rows, image.cols, image.slices);
        println!("  Recon method:    {}", image.recon_method);
    }
    println!(
        "\nSections present: scan={} acquisition={} coincidence={} image={}",
        content.scan.is_some(),
        content.acquisition.is_some(),
        content.coincidence.is_some(),
        content.image.is_some()
    );
    Ok(())
}

fn dump_scan(buf: &[u8]) -> anyhow::Result<()> {
    let set: DataSet = scan::parse_scan(buf, ParseOptions::new().only_header())?;

    println!("Format: native acquisition");
    println!("\n=== Public ===");
    println!("  File type:       {}", kind_name(set.public.type_code));
    println!("  Software:        {}", set.public.software_version);
    println!("  Header length:   {}", set.public.header_length);

    println!("\n=== Device ===");
    println!("  Device:          {}", set.device.device);
    println!("  Serial:          {}", set.device.serial);
    println!("  Rings:           {}", set.device.detector_rings);
    println!("  Channels:        {}", set.device.detector_channels);

    match &set.body {
        Body::Raw { acquisition, data, .. }
        | Body::Listmode { acquisition, data, .. }
        | Body::Mich { acquisition, data, .. } => {
            println!("\n=== Acquisition ===");
            println!("  Isotope:         {}", acquisition.isotope);
            println!("  Duration:        {} s", acquisition.duration);
            println!("  Patient ID:      {}", acquisition.patient_id);
            println!("\n=== Data ===");
            println!("  Payload length:  {} bytes", data.data_length);
        }
        Body::Calibration { kind, data, .. } => {
            println!("\n=== Data ===");
            println!("  Calibration:     {:?}", kind);
            println!("  Payload length:  {} bytes", data.data_length);
        }
        Body::Image { image, data, .. } => {
            println!("\n=== Image ===");
            println!("  Size:            {}x{}x{}", image.rows, image.cols, image.slices);
            println!("  Recon method:    {}", image.recon_method);
            println!("\n=== Data ===");
            println!("  Payload length:  {} bytes", data.data_length);
        }
    }
    Ok(())
}
