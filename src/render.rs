use std::fmt::Write;

use chrono::prelude::*;
use chrono_tz::Tz;
use plotters::prelude::*;
use tracing::debug;

use crate::config::{Labels, RenderConfig};
use crate::error::{Error, Result};
use crate::figure::Figure;
use crate::profile::Slot;
use crate::stats::Spread;
use crate::{min_and_max, suitable_xfmt, DT_FORMAT, VERSION};

/// download, upload
const SERIES_COLORS: [RGBColor; 2] = [RGBColor(30, 144, 255), RGBColor(255, 140, 0)];

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Renders the figure as a standalone html page with inline svg charts
/// and the figure data embedded as json.
pub fn render_document(fig: &Figure, cfg: &RenderConfig, tz: Tz) -> Result<String> {
    let size = (cfg.width, cfg.height);
    let timeline = timeline_svg(fig, tz, size)?;
    let profile = match &fig.profile {
        Some(slots) if !slots.is_empty() => Some(profile_svg(slots, cfg.labels(), size)?),
        _ => None,
    };
    let data = serde_json::to_string(fig).map_err(|e| Error::Render(e.to_string()))?;
    let mut doc = String::with_capacity(timeline.len() + data.len() + 4096);
    write_document(&mut doc, fig, cfg.labels(), tz, &timeline, profile.as_deref(), &data)
        .map_err(|e| Error::Render(e.to_string()))?;
    debug!("rendered document of {} bytes", doc.len());
    Ok(doc)
}

/// The time plot: one line per series, one horizontal line per reference line
pub fn timeline_svg(fig: &Figure, tz: Tz, size: (u32, u32)) -> Result<String> {
    draw_timeline(fig, tz, size).map_err(|e| Error::Render(e.to_string()))
}

/// The weekday/hour profile: download and upload box plots per slot,
/// with the medians drawn on top
pub fn profile_svg(slots: &[Slot], labels: &Labels, size: (u32, u32)) -> Result<String> {
    draw_profile(slots, labels, size).map_err(|e| Error::Render(e.to_string()))
}

fn draw_timeline(fig: &Figure, tz: Tz, size: (u32, u32)) -> DrawResult<String> {
    let (xmindt, xmaxdt) = fig.time_span().ok_or("figure has no points")?;
    let xspan: chrono::Duration = xmaxdt - xmindt;
    let xmargin: chrono::Duration = if xspan > chrono::Duration::zero() {
        xspan / 20
    } else {
        chrono::Duration::hours(1)
    };
    let xmin = xmindt - xmargin;
    let xmax = xmaxdt + xmargin;
    let xfmt = suitable_xfmt(xspan);
    let (ymin, ymax) = fig.value_range().ok_or("figure has no values")?;
    let yspan = if ymax > ymin { (ymax - ymin) / 10f64 } else { 1f64 };
    let ymin = (ymin - yspan).max(0.);
    let ymax = ymax + yspan;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&fig.title, ("sans-serif", 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d(xmin..xmax, ymin..ymax)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 20))
            .y_desc(fig.y_label.as_str())
            .x_labels(14) // max number of labels
            .x_label_formatter(&|x: &DateTime<Utc>| x.with_timezone(&tz).format(xfmt).to_string())
            .y_label_formatter(&|y: &f64| format!("{:.0}", y))
            .x_desc(format!("{} [{}, {}]", fig.x_label, tz.name(), xfmt.replace('%', "")))
            .draw()?;

        for (s, &color) in fig.series.iter().zip(SERIES_COLORS.iter()) {
            chart
                .draw_series(LineSeries::new(s.points(), color.stroke_width(2)))?
                .label(s.name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        for (r, &color) in fig.reference_lines.iter().zip(SERIES_COLORS.iter()) {
            chart
                .draw_series(LineSeries::new(
                    vec![(xmin, r.y), (xmax, r.y)],
                    color.mix(0.6).stroke_width(1),
                ))?
                .label(format!("{} {:.1}", r.name, r.y))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.mix(0.6).stroke_width(1))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 18))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        root.present()?;
    }
    Ok(svg)
}

fn draw_profile(slots: &[Slot], labels: &Labels, size: (u32, u32)) -> DrawResult<String> {
    let sides: [(&str, &str, fn(&Slot) -> (&[f64], &Spread)); 2] = [
        (labels.download, labels.download_median, |s| {
            (s.download_runs.as_slice(), &s.download)
        }),
        (labels.upload, labels.upload_median, |s| {
            (s.upload_runs.as_slice(), &s.upload)
        }),
    ];
    let mut bounds: Vec<f32> = Vec::with_capacity(slots.len() * 16);
    for s in slots {
        for (_, _, side) in sides.iter() {
            let (runs, spread) = side(s);
            bounds.extend(Quartiles::new(runs).values());
            bounds.push((spread.mean - spread.sd) as f32);
            bounds.push((spread.mean + spread.sd) as f32);
        }
    }
    let (ymin, ymax) = min_and_max(&bounds).ok_or("profile has no slots")?;
    let yspan = if ymax > ymin { (ymax - ymin) / 10f32 } else { 1f32 };
    let ymin = (ymin - yspan).max(0.);
    let ymax = ymax + yspan;
    let box_width = (size.0 / (slots.len() as u32 * 3).max(1)).clamp(4, 30);
    let shift = f64::from(box_width) / 2. + 1.;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(labels.profile_title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d((0..slots.len()).into_segmented(), ymin..ymax)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
            .label_style(("sans-serif", 16))
            .x_desc(labels.profile_x_label)
            .y_desc("Mbps")
            .x_labels(slots.len().min(24))
            .x_label_formatter(&|v: &SegmentValue<usize>| match v {
                SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                    slots.get(*i).map(|s| s.label.clone()).unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .y_label_formatter(&|y: &f32| format!("{:.0}", y))
            .draw()?;
        let px_per_mbps = chart.plotting_area().dim_in_pixel().1 as f32 / (ymax - ymin);

        // boxes, with the mean as a tick and +-sd as a bar
        for (k, ((name, _, side), &color)) in
            sides.iter().zip(SERIES_COLORS.iter()).enumerate()
        {
            let offset = if k == 0 { -shift } else { shift };
            chart
                .draw_series(slots.iter().enumerate().map(|(i, s)| {
                    Boxplot::new_vertical(SegmentValue::CenterOf(i), &Quartiles::new(side(s).0))
                        .width(box_width)
                        .whisker_width(0.5)
                        .style(color)
                        .offset(offset)
                }))?
                .label(*name)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.stroke_width(1))
                });

            let dx = offset.round() as i32;
            let half = box_width as i32 / 2;
            let mean_style = color.mix(0.7).stroke_width(1);
            chart.draw_series(slots.iter().enumerate().map(|(i, s)| {
                let spread = side(s).1;
                let sd = (spread.sd as f32 * px_per_mbps).round() as i32;
                EmptyElement::at((SegmentValue::CenterOf(i), spread.mean as f32))
                    + PathElement::new(vec![(dx - half, 0), (dx + half, 0)], mean_style)
                    + PathElement::new(vec![(dx, -sd), (dx, sd)], mean_style)
            }))?;
        }

        for ((_, median_name, side), &color) in sides.iter().zip(SERIES_COLORS.iter()) {
            let median_at =
                |(i, s): (usize, &Slot)| (SegmentValue::CenterOf(i), side(s).1.median as f32);
            chart
                .draw_series(LineSeries::new(
                    slots.iter().enumerate().map(median_at),
                    color.stroke_width(2),
                ))?
                .label(*median_name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                slots
                    .iter()
                    .enumerate()
                    .map(median_at)
                    .map(|p| Circle::new(p, 3, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 16))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        root.present()?;
    }
    Ok(svg)
}

fn write_document(
    doc: &mut String,
    fig: &Figure,
    labels: &Labels,
    tz: Tz,
    timeline: &str,
    profile: Option<&str>,
    data: &str,
) -> std::fmt::Result {
    let locale = escape_html(&fig.locale);
    let title = escape_html(&fig.title);
    let local = |t: DateTime<Utc>| t.with_timezone(&tz).format(DT_FORMAT).to_string();
    let (first, last) = match fig.time_span() {
        Some((a, b)) => (local(a), local(b)),
        None => (String::new(), String::new()),
    };

    writeln!(doc, "<!DOCTYPE html>")?;
    writeln!(doc, "<html lang=\"{}\">", locale)?;
    writeln!(doc, "<head>")?;
    writeln!(doc, "<meta charset=\"utf-8\" />")?;
    writeln!(
        doc,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />"
    )?;
    writeln!(doc, "<meta name=\"language\" content=\"{}\" />", locale)?;
    writeln!(
        doc,
        "<meta http-equiv=\"Content-Language\" content=\"{}\" />",
        locale
    )?;
    writeln!(
        doc,
        "<meta name=\"generator\" content=\"speedchart {}\" />",
        VERSION.unwrap_or("unknown")
    )?;
    writeln!(doc, "<title>{}</title>", title)?;
    writeln!(
        doc,
        "<style>body{{font-family:sans-serif;margin:2em;}}figure{{margin:0 0 2em 0;}}\
         svg{{max-width:100%;height:auto;}}table{{border-collapse:collapse;margin-bottom:2em;}}\
         th,td{{border:1px solid #ccc;padding:0.3em 0.8em;text-align:left;}}</style>"
    )?;
    writeln!(doc, "</head>")?;
    writeln!(doc, "<body>")?;
    writeln!(doc, "<h1>{}</h1>", title)?;
    writeln!(
        doc,
        "<p>{}: {} ({})</p>",
        labels.as_of,
        last,
        escape_html(&fig.timezone)
    )?;

    writeln!(doc, "<table>")?;
    writeln!(
        doc,
        "<tr><th>{}</th><td>{}</td></tr>",
        labels.samples, fig.summary.count
    )?;
    writeln!(
        doc,
        "<tr><th>{}</th><td>{} ~ {}</td></tr>",
        labels.period, first, last
    )?;
    writeln!(
        doc,
        "<tr><th>{}</th><td>{}</td></tr>",
        labels.timezone,
        escape_html(&fig.timezone)
    )?;
    writeln!(
        doc,
        "<tr><th>{}</th><td>{:.2} Mbps</td></tr>",
        labels.download_median, fig.summary.download_median
    )?;
    writeln!(
        doc,
        "<tr><th>{}</th><td>{:.2} Mbps</td></tr>",
        labels.upload_median, fig.summary.upload_median
    )?;
    writeln!(doc, "</table>")?;

    writeln!(doc, "<figure id=\"timeline\">")?;
    writeln!(doc, "{}", timeline)?;
    writeln!(doc, "</figure>")?;
    if let Some(profile) = profile {
        writeln!(doc, "<h2>{}</h2>", labels.profile_title)?;
        writeln!(doc, "<figure id=\"profile\">")?;
        writeln!(doc, "{}", profile)?;
        writeln!(doc, "</figure>")?;
    }

    writeln!(
        doc,
        "<script type=\"application/json\" id=\"chart-data\">{}</script>",
        data.replace("</", "<\\/")
    )?;
    writeln!(doc, "</body>")?;
    writeln!(doc, "</html>")
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
