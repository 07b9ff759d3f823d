use std::fmt::Write;
use std::path::Path;

use super::{DiagSummary, AUTO_FILE};

/// Plain-text report for `summary.txt`.
pub fn render_text(summary: &DiagSummary, outdir: &Path) -> String {
    let mut out = String::new();
    let [r, g, b] = summary.auto_stats.means_rgb;

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Headless Camera Diagnostic Summary");
    let _ = writeln!(out, "Output dir: {}", outdir.display());
    let _ = writeln!(out, "Backend   : {}", summary.backend);
    let _ = writeln!(out, "Resolution: {}x{}", summary.width, summary.height);
    let _ = writeln!(
        out,
        "Flips     : vflip={} hflip={}\n",
        summary.vflip, summary.hflip
    );
    let _ = writeln!(out, "[AUTO]");
    let _ = writeln!(out, "means RGB : [{:.1}, {:.1}, {:.1}]", r, g, b);
    let _ = writeln!(out, "verdict   : {}", summary.auto_verdict);
    let _ = writeln!(out, "file      : {}\n", AUTO_FILE);

    if let Some(sweep) = &summary.manual_sweep {
        let _ = writeln!(out, "[MANUAL SWEEP] (AWB OFF)");
        for item in sweep {
            let [r, g, b] = item.stats.means_rgb;
            let _ = writeln!(
                out,
                "gains=({:.1}, {:.1}) -> means RGB [{:.1}, {:.1}, {:.1}] | {} | {}",
                item.gains.0, item.gains.1, r, g, b, item.verdict, item.file
            );
        }
    }

    let _ = writeln!(out, "\nNotes:");
    let _ = writeln!(
        out,
        "- If {} looks NORMAL, hardware/AWB are fine. If your app still looks blue, it's a channel swap: convert RGB->BGR before display/encode.",
        AUTO_FILE
    );
    let _ = writeln!(
        out,
        "- If all images look heavily blue (B >> R/G), try warmer lighting, or keep AWB ON in your app."
    );
    out
}
