// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::runner::{InspectReport, OrientReport};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report where a model ended up after the load pipeline
    pub fn report_orientation(report: &OrientReport) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "File:".bold(), report.file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        let rotation = if report.rotation == "identity" {
            report.rotation.green()
        } else {
            report.rotation.yellow()
        };
        println!("  {} {}", "Rotation:".bright_black(), rotation);
        if let Some(score) = &report.score {
            println!(
                "  {} {:.2} {}",
                "Support:".bright_black(),
                score.score,
                format!("(area {:.3}, {} contact vertices)", score.area, score.count).bright_black()
            );
        }

        Self::print_vector("Position", report.position);
        Self::print_vector("Bounds min", report.bounds_min);
        Self::print_vector("Bounds max", report.bounds_max);
        Self::print_vector("Camera", report.camera_position);
        println!(
            "  {} {}",
            "Distance:".bright_black(),
            format!("{:.3}", report.camera_distance).cyan()
        );
        println!(
            "  {} {} vertices, {} triangles ({})",
            "Mesh:".bright_black(),
            report.vertices.to_string().cyan(),
            report.triangles.to_string().cyan(),
            report.format
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(report.duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report raw parse statistics
    pub fn report_inspection(report: &InspectReport) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Model:".bold(), report.file.cyan());
        println!("{}", "━".repeat(80).bright_black());
        println!(
            "  {} {}{}",
            "Format:".bright_black(),
            report.format.to_string().cyan(),
            if report.composite { " (hierarchy)" } else { "" }
        );
        println!(
            "  {} {}",
            "Vertices:".bright_black(),
            report.vertices.to_string().cyan()
        );
        println!(
            "  {} {}",
            "Triangles:".bright_black(),
            report.triangles.to_string().cyan()
        );
        Self::print_vector("Bounds min", report.bounds_min);
        Self::print_vector("Bounds max", report.bounds_max);
        Self::print_vector("Size", report.size);
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn print_vector(name: &str, v: [f64; 3]) {
        println!(
            "  {} {}",
            format!("{}:", name).bright_black(),
            Self::format_vector(v)
        );
    }

    fn format_vector(v: [f64; 3]) -> String {
        format!("({:.3}, {:.3}, {:.3})", v[0], v[1], v[2])
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
