use std::io::{self, Write};

use anstyle::{AnsiColor, Color, Style};
use reapprop::Decimal;
use reapprop::model::Discrepancy;
use reapprop::report::{OutputFiles, Summary, largest};

pub struct Styles {
    heading: Style,
    missing: Style,
    ok: Style,
}

impl Styles {
    pub fn colored() -> Self {
        Styles {
            heading: Style::new().bold(),
            missing: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            ok: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))),
        }
    }

    pub fn plain() -> Self {
        Styles {
            heading: Style::new(),
            missing: Style::new(),
            ok: Style::new(),
        }
    }
}

pub fn show_report(
    discrepancies: &[Discrepancy],
    summary: &Summary,
    files: &OutputFiles,
    top: usize,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, discrepancies, summary, files, top, &Styles::colored())?;
    Ok(())
}

pub fn write_report(
    out: &mut impl Write,
    discrepancies: &[Discrepancy],
    summary: &Summary,
    files: &OutputFiles,
    top: usize,
    styles: &Styles,
) -> io::Result<()> {
    let Styles {
        heading,
        missing,
        ok,
    } = styles;

    if discrepancies.is_empty() {
        writeln!(out, "{ok}✓ No discrepancies found!{ok:#}")?;
    } else {
        writeln!(out, "{heading}━━━ Reappropriation Analysis ━━━{heading:#}")?;
        writeln!(
            out,
            "Total missing reappropriations: {missing}{}{missing:#}",
            summary.total_discrepancies
        )?;
        writeln!(
            out,
            "From enacted appropriations:    {}",
            summary.from_enacted_appropriations
        )?;
        writeln!(
            out,
            "From enacted reappropriations:  {}",
            summary.from_enacted_reappropriations
        )?;
        writeln!(out, "Agencies affected:              {}", summary.agencies_affected)?;
        writeln!(
            out,
            "Total amount missing:           {missing}{}{missing:#}",
            format_amount(summary.total_amount_missing)
        )?;
        writeln!(out)?;

        let largest = largest(discrepancies, top);
        writeln!(
            out,
            "{heading}━━━ Top {} largest missing reappropriations ━━━{heading:#}",
            largest.len()
        )?;
        for (rank, discrepancy) in largest.iter().enumerate() {
            let record = &discrepancy.record;
            writeln!(out, "{:2}. {}", rank + 1, record.agency)?;
            writeln!(
                out,
                "    ID: {} | Amount: {}",
                record.appropriation_id,
                format_amount(record.amount)
            )?;
            writeln!(
                out,
                "    Type: {} | Budget: {} | Year: {}",
                record.entry_kind, record.budget_type, record.year
            )?;
        }
        writeln!(out)?;

        writeln!(out, "{heading}━━━ Summary by agency ━━━{heading:#}")?;
        for (agency, total) in &summary.agency_totals {
            writeln!(out, "{agency}")?;
            writeln!(
                out,
                "  Items: {} | Amount: {}",
                total.count,
                format_amount(total.amount)
            )?;
            writeln!(
                out,
                "  From appropriations: {} | From reappropriations: {}",
                total.from_appropriations, total.from_reappropriations
            )?;
        }
    }
    writeln!(out)?;

    writeln!(out, "{heading}Files generated:{heading:#}")?;
    for (path, what) in [
        (&files.discrepancies, "missing reappropriations"),
        (&files.enacted, "records extracted from the enacted budget"),
        (&files.executive, "records extracted from the executive budget"),
        (&files.summary, "summary statistics"),
    ] {
        writeln!(out, "  {} - {what}", path.display())?;
    }

    Ok(())
}

/// `$1,234,567.89`
pub fn format_amount(amount: Decimal) -> String {
    let formatted = format!("{:.2}", amount.round_dp(2));
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (whole, cents) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}
