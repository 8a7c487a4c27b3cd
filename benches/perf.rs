use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use edgefinder_terminal::report_fetch::parse_report_markdown;
use edgefinder_terminal::state::{classify_discrepancy, classify_volume, volume_ranked};

fn large_newsletter_doc(rows: usize) -> String {
    let mut doc = String::new();
    doc.push_str("# EdgeFinder: Robinhood vs Sportsbooks\n\n");
    doc.push_str("**Generated:** 2024-01-01T00:00:00Z\n\n");
    doc.push_str(&format!(
        "**Summary:** {rows} matched games, {} markets, 5 book odds\n\n",
        rows * 2
    ));
    for (title, reverse) in [("## Biggest Discrepancies", false), ("## Most Bet", true)] {
        doc.push_str(title);
        doc.push_str("\n\n");
        doc.push_str("| Rank | Sport | Game | Start Time | Pred Prob | Books (min/avg/max) | Discrepancy | Volume | Payout |\n");
        doc.push_str("|------|-------|------|-------------|-----------|---------------------|-------------|--------|--------|\n");
        for i in 0..rows {
            let idx = if reverse { rows - i } else { i + 1 };
            doc.push_str(&format!(
                "| {idx} | NBA | Team{idx} @ Team{} | 2024-01-01 07:30 PM PST | 0.565 | 0.610/0.642/0.675 | 0.{:03} | {},500 | 1.8x |\n",
                idx + 1,
                idx % 200,
                idx % 9 + 1,
            ));
        }
        doc.push('\n');
    }
    doc.push_str("## 🏠 Hometown Favorite: Seattle\n\n**Seahawks @ 49ers**\n\n");
    doc.push_str("- **Prediction Market:** 41.0%\n- **Sportsbook Average:** 47.0%\n");
    doc
}

fn bench_parse_report(c: &mut Criterion) {
    let doc = large_newsletter_doc(200);
    c.bench_function("parse_report_markdown_200_rows", |b| {
        b.iter(|| {
            let report = parse_report_markdown(black_box(&doc));
            black_box(report);
        })
    });
}

fn bench_volume_ranked(c: &mut Criterion) {
    let doc = large_newsletter_doc(200);
    let report = parse_report_markdown(&doc);
    let rows = &report.sections[0].rows;
    c.bench_function("volume_ranked_200_rows", |b| {
        b.iter(|| {
            let ranked = volume_ranked(black_box(rows));
            black_box(ranked);
        })
    });
}

fn bench_classification(c: &mut Criterion) {
    let inputs = ["0.12", "12%", "0.07", "7%", "0.02", "2%", "n/a"];
    let volumes = ["2,500", "1,200", "500", "-"];
    c.bench_function("classify_cells", |b| {
        b.iter(|| {
            for input in inputs {
                black_box(classify_discrepancy(black_box(input)));
            }
            for volume in volumes {
                black_box(classify_volume(black_box(volume)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_parse_report,
    bench_volume_ranked,
    bench_classification
);
criterion_main!(benches);
