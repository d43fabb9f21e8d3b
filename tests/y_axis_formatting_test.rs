// tests/y_axis_formatting_test.rs

use bridge_monitor::plot_framework::format_y_label;

#[test]
fn test_large_values_use_suffixes() {
    assert_eq!(format_y_label(2_500_000.0), "2.5M");
    assert_eq!(format_y_label(2000.0), "2k");
    assert_eq!(format_y_label(12_000.0), "12k");
    assert_eq!(format_y_label(-4000.0), "-4k");
}

#[test]
fn test_whole_numbers_above_ten() {
    assert_eq!(format_y_label(0.0), "0");
    assert_eq!(format_y_label(10.0), "10");
    assert_eq!(format_y_label(250.0), "250");
    assert_eq!(format_y_label(-25.0), "-25");
}

#[test]
fn test_gyro_scale_values_keep_decimals() {
    // rad/s and degree ticks on the summary charts sit well below 10
    assert_eq!(format_y_label(2.5), "2.5");
    assert_eq!(format_y_label(1.0), "1.0");
    assert_eq!(format_y_label(0.25), "0.25");
    assert_eq!(format_y_label(-0.4), "-0.40");
    assert_eq!(format_y_label(0.05), "0.050");
}

#[test]
fn test_tick_sequence_is_distinct() {
    let ticks = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
    let labels: Vec<String> = ticks.iter().map(|&y| format_y_label(y)).collect();
    assert_eq!(labels, vec!["0", "0.10", "0.20", "0.30", "0.40", "0.50"]);
}

// tests/y_axis_formatting_test.rs
