//! Plain text tables for the terminal.

use std::fmt::Write;

use rust_decimal::Decimal;

use crate::{
    app::{import::ImportSummary, portfolio::TaxYears},
    models::{
        GainTotals, IncomeReport, RealizedReport, ReportFailure, Transaction, UnrealizedReport,
    },
};

fn amount(value: &Decimal) -> String {
    format!("{:.2}", value)
}

fn line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == 0 {
                format!("{:<width$}", cell, width = *width)
            } else {
                format!("{:>width$}", cell, width = *width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn table(header: &[&str], widths: &[usize], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let _ = writeln!(out, "{}", line(&header, widths));
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}", "-".repeat(total));
    for row in rows {
        let _ = writeln!(out, "{}", line(row, widths));
    }
    out
}

fn totals_row(label: &str, totals: &GainTotals) -> Vec<String> {
    vec![
        label.to_string(),
        amount(totals.proceeds()),
        amount(totals.cost()),
        amount(totals.gains()),
        amount(totals.losses()),
        amount(totals.net()),
    ]
}

fn failures(out: &mut String, failures: &[ReportFailure]) {
    if failures.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nNot included:");
    for failure in failures {
        let _ = writeln!(out, "  {}: {}", failure.instrument(), failure.message());
    }
}

pub fn realized(report: &RealizedReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Realized gains {} ({})\n",
        report.period(),
        report.reporting_currency()
    );

    if report.rows().is_empty() {
        let _ = writeln!(out, "No closed positions in this period.");
    } else {
        let rows: Vec<Vec<String>> = report
            .rows()
            .iter()
            .map(|gain| {
                vec![
                    gain.instrument().clone(),
                    gain.open_date().to_string(),
                    gain.close_date().to_string(),
                    gain.quantity().normalize().to_string(),
                    format!("{} {}", amount(gain.gain()), gain.currency()),
                    amount(gain.proceeds_reporting()),
                    amount(gain.cost_reporting()),
                    amount(gain.gain_reporting()),
                    gain.term().to_string(),
                ]
            })
            .collect();
        out.push_str(&table(
            &[
                "Instrument", "Opened", "Closed", "Qty", "Gain (native)", "Proceeds", "Cost",
                "Gain", "Term",
            ],
            &[12, 10, 10, 10, 16, 12, 12, 12, 5],
            &rows,
        ));

        let summary = report.summary();
        let _ = writeln!(out);
        out.push_str(&table(
            &["Summary", "Proceeds", "Cost", "Gains", "Losses", "Net"],
            &[16, 12, 12, 12, 12, 12],
            &[
                totals_row("Short term", summary.short_term()),
                totals_row("Long term", summary.long_term()),
                totals_row("Total", summary.total()),
            ],
        ));

        let categories: Vec<Vec<String>> = summary
            .by_category()
            .iter()
            .map(|(category, totals)| totals_row(category, totals))
            .collect();
        let _ = writeln!(out);
        out.push_str(&table(
            &["Category", "Proceeds", "Cost", "Gains", "Losses", "Net"],
            &[16, 12, 12, 12, 12, 12],
            &categories,
        ));
    }

    failures(&mut out, report.failures());
    out
}

pub fn unrealized(report: &UnrealizedReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Open positions as of {} ({})\n",
        report.as_of(),
        report.reporting_currency()
    );

    if report.positions().is_empty() {
        let _ = writeln!(out, "No open positions.");
    } else {
        let mut rows: Vec<Vec<String>> = report
            .positions()
            .iter()
            .map(|position| {
                vec![
                    position.instrument().clone(),
                    position.quantity().normalize().to_string(),
                    format!("{} {}", amount(position.price()), position.currency()),
                    amount(position.cost_basis_reporting()),
                    amount(position.market_value_reporting()),
                    amount(position.unrealized_gain_reporting()),
                    amount(position.dividends_reporting()),
                ]
            })
            .collect();
        rows.push(vec![
            String::from("Total"),
            String::new(),
            String::new(),
            amount(report.total_cost_basis()),
            amount(report.total_market_value()),
            amount(report.total_unrealized_gain()),
            String::new(),
        ]);
        out.push_str(&table(
            &["Instrument", "Qty", "Price", "Cost", "Value", "Unr. G/L", "Div."],
            &[12, 10, 14, 12, 12, 12, 10],
            &rows,
        ));
    }

    failures(&mut out, report.failures());
    out
}

pub fn income(report: &IncomeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Dividends and fees {} ({})\n",
        report.period(),
        report.reporting_currency()
    );

    let rows: Vec<Vec<String>> = report
        .by_instrument()
        .iter()
        .map(|(instrument, income)| {
            vec![
                instrument.clone(),
                income.currency().clone(),
                amount(income.gross_dividends()),
                amount(income.withholding_tax()),
                amount(income.net_dividends_reporting()),
                amount(income.fees_reporting()),
            ]
        })
        .collect();
    out.push_str(&table(
        &["Instrument", "Ccy", "Gross", "Withheld", "Net", "Fees"],
        &[12, 4, 12, 12, 12, 12],
        &rows,
    ));

    let _ = writeln!(
        out,
        "\nGross dividends {}  Withholding tax {}  Net dividends {}  Fees {}",
        amount(report.gross_dividends()),
        amount(report.withholding_tax()),
        amount(report.net_dividends()),
        amount(report.fees())
    );

    failures(&mut out, report.failures());
    out
}

pub fn transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return String::from("No transactions.\n");
    }
    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|transaction| {
            vec![
                transaction.id().to_string(),
                format!("{} {}", transaction.trade_date(), transaction.trade_time()),
                transaction.instrument().clone(),
                transaction.transaction_type().to_string(),
                transaction.quantity().normalize().to_string(),
                amount(transaction.price()),
                transaction.currency().clone(),
                amount(transaction.fees()),
            ]
        })
        .collect();
    table(
        &["Id", "Traded", "Instrument", "Type", "Qty", "Price", "Ccy", "Fees"],
        &[6, 19, 22, 9, 10, 12, 4, 8],
        &rows,
    )
}

pub fn import_summary(summary: &ImportSummary) -> String {
    let mut out = format!(
        "Imported {}, duplicates {}, skipped {}, errors {}\n",
        summary.imported(),
        summary.duplicates(),
        summary.skipped(),
        summary.errors().len()
    );
    for error in summary.errors() {
        let _ = writeln!(out, "  {}", error);
    }
    out
}

pub fn tax_years(years: &TaxYears) -> String {
    let mut out = format!("{}\n", years.ytd_label());
    for year in years.available_years() {
        let _ = writeln!(out, "{}", year);
    }
    out
}
