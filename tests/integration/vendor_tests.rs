//! End-to-end anonymization runs on synthetic slide files.
//!
//! These tests verify, per vendor:
//! - Label and macro images are wiped (and unlinked where supported)
//! - Identifying metadata is masked without changing the file size
//! - The original file is left untouched unless running in place

use wsi_anonymizer::{anonymize, inspect, AnonymizeError, AnonymizeOptions, Vendor};

use super::test_utils::{
    capture_logs, create_aperio_slide, create_ndpi_slide, create_philips_slide,
    create_ventana_slide, is_valid_jpeg, parse, strips, texts, ByteOrderType, TempDir, COMPRESSION, DATE_TIME,
    IMAGE_DESCRIPTION, XMP,
};

fn options() -> AnonymizeOptions {
    AnonymizeOptions::default()
}

fn compression(data: &[u8], index: usize) -> u16 {
    let file = parse(data, false);
    let entry = file.directories[index].find_entry(COMPRESSION).unwrap();
    u16::from_le_bytes([entry.slot[0], entry.slot[1]])
}

// =============================================================================
// Aperio Tests
// =============================================================================

#[test]
fn test_aperio_anonymize_copy() {
    let dir = TempDir::new("aperio");
    let original = create_aperio_slide("");
    let path = dir.write("CMU-1.svs", &original);

    let report = anonymize(&path, &options()).unwrap();

    assert_eq!(report.vendor, Vendor::Aperio);
    assert_eq!(report.path, dir.path().join("anonymized_CMU-1.svs"));
    assert_eq!(report.wiped_directories, vec![2, 3]);
    assert_eq!(report.unlinked_directories, vec![3, 2]);
    assert_eq!(report.redacted_entries, 1);

    // Source untouched
    assert_eq!(std::fs::read(&path).unwrap(), original);

    let anonymized = std::fs::read(&report.path).unwrap();
    assert_eq!(anonymized.len(), original.len());
    assert_eq!(parse(&anonymized, false).len(), 2);

    let description = &texts(&anonymized, false, IMAGE_DESCRIPTION)[0];
    assert!(description.contains("|ScanScope ID = XXXXXX|"));
    assert!(description.contains("|Filename = XXXX|"));
    assert!(description.contains("|Date = 01/01/00|"));
    assert!(description.contains("|Time = 00:00:00|"));
    assert!(description.contains("|User = XXXX|"));
    assert!(description.contains("|Barcode = XXXX|"));
    assert!(description.contains("|AppMag = 20|"));
}

#[test]
fn test_aperio_images_wiped() {
    let dir = TempDir::new("aperio_wipe");
    let original = create_aperio_slide("");
    let path = dir.write("slide.svs", &original);

    let options = AnonymizeOptions {
        disable_unlinking: true,
        ..options()
    };
    let report = anonymize(&path, &options).unwrap();
    assert!(report.unlinked_directories.is_empty());

    let anonymized = std::fs::read(&report.path).unwrap();
    assert_eq!(parse(&anonymized, false).len(), 4);

    // Label keeps the LZW clear code, macro is all zeros
    let label = strips(&anonymized, false, 2).remove(0);
    assert_eq!(label[0], 0x80);
    assert!(label[1..].iter().all(|&b| b == 0));
    let macro_image = strips(&anonymized, false, 3).remove(0);
    assert!(macro_image.iter().all(|&b| b == 0));

    // Pyramid images untouched
    assert_eq!(strips(&anonymized, false, 0), strips(&original, false, 0));
    assert_eq!(strips(&anonymized, false, 1), strips(&original, false, 1));
    assert_eq!(compression(&anonymized, 3), 7);
}

#[test]
fn test_aperio_gt450_macro_relabelled() {
    let dir = TempDir::new("aperio_gt450");
    let path = dir.write("gt450.svs", &create_aperio_slide("ScannerType = GT450"));

    let options = AnonymizeOptions {
        disable_unlinking: true,
        ..options()
    };
    let report = anonymize(&path, &options).unwrap();
    let anonymized = std::fs::read(&report.path).unwrap();

    assert_eq!(compression(&anonymized, 3), 5);
    assert_eq!(compression(&anonymized, 0), 7);
}

#[test]
fn test_aperio_kfbio_label_zero_filled() {
    let dir = TempDir::new("aperio_kfbio");
    let path = dir.write("kfbio.svs", &create_aperio_slide("KFBIO converted"));

    let options = AnonymizeOptions {
        disable_unlinking: true,
        ..options()
    };
    let report = anonymize(&path, &options).unwrap();
    let anonymized = std::fs::read(&report.path).unwrap();

    assert!(strips(&anonymized, false, 2)[0].iter().all(|&b| b == 0));
}

#[test]
fn test_aperio_keep_macro_image() {
    let dir = TempDir::new("aperio_macro");
    let original = create_aperio_slide("");
    let path = dir.write("slide.svs", &original);

    let options = AnonymizeOptions {
        keep_macro_image: true,
        new_name: Some("case-7".to_string()),
        ..options()
    };
    let report = anonymize(&path, &options).unwrap();

    assert_eq!(report.path, dir.path().join("case-7.svs"));
    assert_eq!(report.wiped_directories, vec![2]);
    assert_eq!(report.unlinked_directories, vec![2]);

    let anonymized = std::fs::read(&report.path).unwrap();
    let file = parse(&anonymized, false);
    assert_eq!(file.len(), 3);
    assert_eq!(strips(&anonymized, false, 2), strips(&original, false, 3));
}

#[test]
fn test_aperio_in_place_with_pseudonym() {
    let dir = TempDir::new("aperio_in_place");
    let path = dir.write("slide.svs", &create_aperio_slide(""));

    let options = AnonymizeOptions {
        in_place: true,
        pseudonym: '#',
        ..options()
    };
    let report = anonymize(&path, &options).unwrap();
    assert_eq!(report.path, path);
    assert!(!dir.path().join("anonymized_slide.svs").exists());

    let anonymized = std::fs::read(&path).unwrap();
    assert!(texts(&anonymized, false, IMAGE_DESCRIPTION)[0].contains("|User = ####|"));
}

#[test]
fn test_aperio_metadata_listing() {
    let dir = TempDir::new("aperio_info");
    let path = dir.write("slide.svs", &create_aperio_slide(""));

    let info = inspect(&path).unwrap();
    assert_eq!(info.vendor, Some(Vendor::Aperio));

    let value = |key: &str| {
        info.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.clone())
    };
    assert_eq!(value("User").as_deref(), Some("jdoe"));
    assert_eq!(value("Date").as_deref(), Some("03/12/21"));
    assert_eq!(value("ScanScope ID").as_deref(), Some("SS1302"));

    // Listing an anonymized copy shows masked values only
    let report = anonymize(&path, &options()).unwrap();
    let info = inspect(&report.path).unwrap();
    assert!(info
        .attributes
        .iter()
        .all(|a| a.value.chars().all(|c| c == 'X') || a.key == "Date" || a.key == "Time"));
}

#[test]
fn test_aperio_missing_label() {
    let dir = TempDir::new("aperio_no_label");
    let data = super::test_utils::TiffBuilder::new()
        .add_directory(
            super::test_utils::DirectoryBuilder::new()
                .ascii(IMAGE_DESCRIPTION, "Aperio Image Library v12.0.15\r\n1000x1000")
                .strip(vec![1, 2, 3, 4, 5, 6, 7, 8]),
        )
        .build();
    let path = dir.write("nolabel.svs", &data);

    let result = anonymize(&path, &options());
    assert!(matches!(
        result,
        Err(AnonymizeError::MissingDirectory { kind: "label" })
    ));
}

// =============================================================================
// Hamamatsu Tests
// =============================================================================

#[test]
fn test_hamamatsu_anonymize() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let dir = TempDir::new("ndpi");
        let original = create_ndpi_slide(order);
        let path = dir.write("slide.ndpi", &original);

        let report = anonymize(&path, &options()).unwrap();
        assert_eq!(report.vendor, Vendor::Hamamatsu);
        assert_eq!(report.wiped_directories, vec![1]);
        assert_eq!(report.unlinked_directories, vec![1]);
        assert_eq!(report.redacted_entries, 2);

        let anonymized = std::fs::read(&report.path).unwrap();
        assert_eq!(anonymized.len(), original.len());
        assert_eq!(parse(&anonymized, true).len(), 1);
        assert_eq!(
            texts(&anonymized, true, DATE_TIME),
            vec!["XXXXXXXXXXXXXXXXXXX"]
        );
        assert_eq!(strips(&anonymized, true, 0), strips(&original, true, 0));
    }
}

#[test]
fn test_hamamatsu_macro_keeps_jpeg_frame() {
    let dir = TempDir::new("ndpi_frame");
    let path = dir.write("slide.ndpi", &create_ndpi_slide(ByteOrderType::LittleEndian));

    let options = AnonymizeOptions {
        disable_unlinking: true,
        keep_macro_image: true,
        ..options()
    };
    let report = anonymize(&path, &options).unwrap();
    assert!(report.unlinked_directories.is_empty());

    let anonymized = std::fs::read(&report.path).unwrap();
    let macro_image = strips(&anonymized, true, 1).remove(0);
    assert!(is_valid_jpeg(&macro_image));
    assert!(macro_image[2..macro_image.len() - 2].iter().all(|&b| b == 0));
}

#[test]
fn test_hamamatsu_rerun_in_place() {
    let dir = TempDir::new("ndpi_twice");
    let path = dir.write("slide.ndpi", &create_ndpi_slide(ByteOrderType::LittleEndian));

    let options = AnonymizeOptions {
        in_place: true,
        disable_unlinking: true,
        ..options()
    };
    anonymize(&path, &options).unwrap();

    // The wiped macro still starts with SOI, so a rerun succeeds
    anonymize(&path, &options).unwrap();
}

// =============================================================================
// Ventana Tests
// =============================================================================

#[test]
fn test_ventana_anonymize() {
    let dir = TempDir::new("ventana");
    let original = create_ventana_slide();
    let path = dir.write("slide.bif", &original);

    let report = anonymize(&path, &options()).unwrap();
    assert_eq!(report.vendor, Vendor::Ventana);
    assert_eq!(report.wiped_directories, vec![1]);
    assert!(report.unlinked_directories.is_empty());
    assert_eq!(report.redacted_entries, 2);

    let anonymized = std::fs::read(&report.path).unwrap();
    assert_eq!(anonymized.len(), original.len());
    assert_eq!(parse(&anonymized, false).len(), 2);
    assert!(strips(&anonymized, false, 1)[0].iter().all(|&b| b == 0));

    let xmp = &texts(&anonymized, false, XMP)[0];
    assert!(xmp.contains(r#"BaseName="        ""#));
    assert!(xmp.contains("UserName='    '"));
    assert!(xmp.contains(r#"BuildDate="          ""#));
    assert!(xmp.contains("Barcode1D='    '"));
    assert!(xmp.contains(r#"Magnification="40""#));

    assert_eq!(texts(&anonymized, false, DATE_TIME), vec![" ".repeat(19)]);
}

#[test]
fn test_ventana_warns_that_label_stays_linked() {
    let dir = TempDir::new("ventana_warn");
    let path = dir.write("slide.bif", &create_ventana_slide());

    let (report, logs) = capture_logs(|| anonymize(&path, &options()));
    assert!(report.unwrap().unlinked_directories.is_empty());
    assert!(logs.lines().any(|line| line.contains("WARN") && line.contains("not unlinked")));

    let unlinking_off = AnonymizeOptions {
        disable_unlinking: true,
        in_place: true,
        ..options()
    };
    let (report, logs) = capture_logs(|| anonymize(&path, &unlinking_off));
    assert!(report.is_ok());
    assert!(!logs.contains("not unlinked"));
}

// =============================================================================
// Philips Tests
// =============================================================================

#[test]
fn test_philips_anonymize() {
    let dir = TempDir::new("philips");
    let original = create_philips_slide();
    let path = dir.write("slide.tiff", &original);

    let report = anonymize(&path, &options()).unwrap();
    assert_eq!(report.vendor, Vendor::PhilipsTiff);
    assert_eq!(report.wiped_directories, vec![2, 1]);
    assert!(report.unlinked_directories.is_empty());
    assert_eq!(report.redacted_entries, 1);

    let anonymized = std::fs::read(&report.path).unwrap();
    assert_eq!(anonymized.len(), original.len());
    assert!(strips(&anonymized, false, 1)[0].iter().all(|&b| b == 0));
    assert!(strips(&anonymized, false, 2)[0].iter().all(|&b| b == 0));
    assert_eq!(strips(&anonymized, false, 0), strips(&original, false, 0));

    let xml = &texts(&anonymized, false, IMAGE_DESCRIPTION)[0];
    assert!(xml.contains(r#"PMSVR="IString">19000101000000.000000</Attribute>"#));
    assert!(xml.contains(r#"PMSVR="IString">XXXXXXX</Attribute>"#));
    assert!(xml.contains(r#"PMSVR="IString">XXXX</Attribute>"#));
    assert!(xml.contains(r#"PMSVR="IString">AAAAAAAAAAAAAAAA</Attribute>"#));
    assert!(xml.contains(r#"PMSVR="IString">AAAAAAAAAAAA</Attribute>"#));
    assert!(!xml.contains("PIM_DP_SCANNER_SLOT_NUMBER"));
    assert!(!xml.contains("FMT0042"));
}

#[test]
fn test_philips_warns_that_images_stay_linked() {
    let dir = TempDir::new("philips_warn");
    let path = dir.write("slide.tiff", &create_philips_slide());

    let (report, logs) = capture_logs(|| anonymize(&path, &options()));
    assert_eq!(report.unwrap().wiped_directories, vec![2, 1]);
    assert!(logs.lines().any(|line| line.contains("WARN") && line.contains("not unlinked")));
}

#[test]
fn test_philips_keep_macro_image() {
    let dir = TempDir::new("philips_macro");
    let original = create_philips_slide();
    let path = dir.write("slide.tiff", &original);

    let options = AnonymizeOptions {
        keep_macro_image: true,
        ..options()
    };
    let report = anonymize(&path, &options).unwrap();
    assert_eq!(report.wiped_directories, vec![2]);

    let anonymized = std::fs::read(&report.path).unwrap();
    assert_eq!(strips(&anonymized, false, 1), strips(&original, false, 1));

    let xml = &texts(&anonymized, false, IMAGE_DESCRIPTION)[0];
    assert!(xml.contains("/9j/2wBDAAgG"));
    assert!(!xml.contains("/9j/4AAQSkZJRg=="));
}

#[test]
fn test_philips_metadata_listing() {
    let dir = TempDir::new("philips_info");
    let path = dir.write("slide.tiff", &create_philips_slide());

    let info = inspect(&path).unwrap();
    assert_eq!(info.vendor, Some(Vendor::PhilipsTiff));

    let keys: Vec<&str> = info.attributes.iter().map(|a| a.key.as_str()).collect();
    assert!(keys.contains(&"DICOM_ACQUISITION_DATETIME"));
    assert!(keys.contains(&"DICOM_DEVICE_SERIAL_NUMBER"));
    assert!(keys.contains(&"PIM_DP_SCANNER_OPERATOR_ID"));
    assert!(keys.contains(&"PIM_DP_SCANNER_SLOT_NUMBER"));
}
