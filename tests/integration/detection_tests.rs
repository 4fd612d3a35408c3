//! Vendor detection and multi-file runs.

use std::path::Path;

use wsi_anonymizer::io::MemoryStore;
use wsi_anonymizer::{anonymize, detect, detect_vendor, AnonymizeOptions, Vendor};

use super::test_utils::{
    create_aperio_slide, create_ndpi_slide, create_philips_slide, create_ventana_slide,
    ByteOrderType, Container, DirectoryBuilder, TempDir, TiffBuilder, IMAGE_DESCRIPTION,
};

fn detect_bytes(file_name: &str, data: Vec<u8>) -> Option<Vendor> {
    let mut store = MemoryStore::new(data, file_name);
    detect_vendor(Path::new(file_name), &mut store).unwrap()
}

// =============================================================================
// Detection Tests
// =============================================================================

#[test]
fn test_detect_each_vendor() {
    assert_eq!(detect_bytes("a.svs", create_aperio_slide("")), Some(Vendor::Aperio));
    assert_eq!(detect_bytes("a.tif", create_aperio_slide("")), Some(Vendor::Aperio));
    assert_eq!(
        detect_bytes("a.ndpi", create_ndpi_slide(ByteOrderType::BigEndian)),
        Some(Vendor::Hamamatsu)
    );
    assert_eq!(detect_bytes("a.bif", create_ventana_slide()), Some(Vendor::Ventana));
    assert_eq!(detect_bytes("a.tif", create_ventana_slide()), Some(Vendor::Ventana));
    assert_eq!(detect_bytes("a.tiff", create_philips_slide()), Some(Vendor::PhilipsTiff));
}

#[test]
fn test_detect_extension_is_case_insensitive() {
    assert_eq!(detect_bytes("A.SVS", create_aperio_slide("")), Some(Vendor::Aperio));
    assert_eq!(
        detect_bytes("slide.NDPI", create_ndpi_slide(ByteOrderType::LittleEndian)),
        Some(Vendor::Hamamatsu)
    );
}

#[test]
fn test_detect_content_mismatch() {
    // Right extension, wrong content
    assert_eq!(detect_bytes("a.svs", create_philips_slide()), None);
    assert_eq!(detect_bytes("a.tiff", create_aperio_slide("")), None);

    // Ventana requires BigTIFF
    let classic_with_xmp = TiffBuilder::new()
        .add_directory(
            DirectoryBuilder::new()
                .bytes(700, br#"<iScan BaseName="x"/>"#)
                .strip(vec![0; 8]),
        )
        .build();
    assert_eq!(detect_bytes("a.bif", classic_with_xmp), None);
}

#[test]
fn test_detect_unknown_extension() {
    assert_eq!(detect_bytes("a.mrxs", create_aperio_slide("")), None);
    assert_eq!(detect_bytes("slide", create_aperio_slide("")), None);
}

#[test]
fn test_detect_non_tiff() {
    assert_eq!(detect_bytes("a.svs", b"GIF89a not a slide".to_vec()), None);
    assert_eq!(detect_bytes("a.ndpi", vec![0x49, 0x49]), None);
}

#[test]
fn test_detect_bigtiff_aperio() {
    let data = TiffBuilder::new()
        .with_container(Container::BigTiff)
        .add_directory(
            DirectoryBuilder::new()
                .ascii(IMAGE_DESCRIPTION, "Aperio Image Library v12.0.15")
                .strip(vec![0; 8]),
        )
        .build();
    assert_eq!(detect_bytes("big.svs", data), Some(Vendor::Aperio));
}

#[test]
fn test_detect_file() {
    let dir = TempDir::new("detect");
    let path = dir.write("slide.bif", &create_ventana_slide());
    let original = std::fs::read(&path).unwrap();

    assert_eq!(detect(&path).unwrap(), Some(Vendor::Ventana));
    assert_eq!(std::fs::read(&path).unwrap(), original);
}

// =============================================================================
// Concurrent Run Tests
// =============================================================================

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let dir = TempDir::new("concurrent");
    let paths = vec![
        dir.write("a.svs", &create_aperio_slide("")),
        dir.write("b.ndpi", &create_ndpi_slide(ByteOrderType::LittleEndian)),
        dir.write("c.bif", &create_ventana_slide()),
        dir.write("d.tiff", &create_philips_slide()),
    ];

    let handles: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| {
            tokio::task::spawn_blocking(move || anonymize(&path, &AnonymizeOptions::default()))
        })
        .collect();

    let mut vendors = Vec::new();
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert!(report.path.exists());
        vendors.push(report.vendor);
    }

    assert_eq!(
        vendors,
        vec![
            Vendor::Aperio,
            Vendor::Hamamatsu,
            Vendor::Ventana,
            Vendor::PhilipsTiff
        ]
    );
}

#[tokio::test]
async fn test_failure_does_not_affect_other_runs() {
    let dir = TempDir::new("mixed");
    let good = dir.write("good.svs", &create_aperio_slide(""));
    let bad = dir.write("bad.svs", b"not a slide");

    let run = |path: std::path::PathBuf| {
        tokio::task::spawn_blocking(move || anonymize(&path, &AnonymizeOptions::default()))
    };
    let bad_result = run(bad).await.unwrap();
    let good_result = run(good).await.unwrap();

    assert!(bad_result.is_err());
    assert!(good_result.is_ok());
}
