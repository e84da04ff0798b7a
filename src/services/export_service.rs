use rust_xlsxwriter::*;

use crate::error::Result;
use crate::models::candidate::CandidateApplication;
use crate::models::employer_request::EmployerRequest;
use crate::models::job::JobPosting;
use crate::utils::currency::{format_display_date, format_salary_range, job_currency};

/// A record that can be written as one spreadsheet row.
pub trait ExportRow {
    const TITLE: &'static str;
    /// Column header and width.
    const COLUMNS: &'static [(&'static str, f64)];

    fn cells(&self) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("—")
        .to_string()
}

impl ExportRow for CandidateApplication {
    const TITLE: &'static str = "Candidate Applications";
    const COLUMNS: &'static [(&'static str, f64)] = &[
        ("Name", 28.0),
        ("Email", 30.0),
        ("Nationality", 16.0),
        ("Country", 20.0),
        ("Expected Salary", 16.0),
        ("Experience", 12.0),
        ("Position", 28.0),
        ("CV", 36.0),
        ("Submitted", 14.0),
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.nationality.clone(),
            self.country.clone(),
            self.expected_salary.to_string(),
            self.experience.to_string(),
            or_dash(self.job_title.as_deref()),
            or_dash(self.cv_url.as_deref()),
            format_display_date(self.created_at),
        ]
    }
}

impl ExportRow for EmployerRequest {
    const TITLE: &'static str = "Employer Requests";
    const COLUMNS: &'static [(&'static str, f64)] = &[
        ("Firm", 28.0),
        ("Contact Email", 30.0),
        ("Country", 20.0),
        ("Position", 24.0),
        ("Preferred Location", 20.0),
        ("Preferred Nationality", 20.0),
        ("Budget", 14.0),
        ("Experience", 12.0),
        ("Qualifications", 40.0),
        ("Submitted", 14.0),
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.firm_name.clone(),
            self.contact_email.clone(),
            self.country.clone(),
            or_dash(self.position_title.as_deref()),
            self.preferred_location.clone(),
            self.preferred_nationality.clone(),
            self.budget.to_string(),
            self.experience.to_string(),
            or_dash(self.qualifications.as_deref()),
            format_display_date(self.created_at),
        ]
    }
}

impl ExportRow for JobPosting {
    const TITLE: &'static str = "Job Postings";
    const COLUMNS: &'static [(&'static str, f64)] = &[
        ("Title", 28.0),
        ("Country", 20.0),
        ("Location", 18.0),
        ("Work Type", 12.0),
        ("Experience", 12.0),
        ("Salary", 22.0),
        ("Status", 12.0),
        ("Posted", 14.0),
    ];

    fn cells(&self) -> Vec<String> {
        let status = if self.is_archived {
            "archived"
        } else if self.is_active {
            "active"
        } else {
            "inactive"
        };
        vec![
            self.title.clone(),
            self.country.clone(),
            self.location.clone(),
            self.work_type.to_string(),
            self.experience.to_string(),
            self.salary_range
                .as_deref()
                .map(|range| format_salary_range(range, &job_currency(self)))
                .unwrap_or_else(|| "—".to_string()),
            status.to_string(),
            format_display_date(self.created_at),
        ]
    }
}

/// RFC 4180 field quoting.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut line = fields.into_iter().map(csv_field).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

pub struct ExportService;

impl ExportService {
    pub fn to_csv<T: ExportRow>(rows: &[T]) -> String {
        let mut out = csv_line(T::COLUMNS.iter().map(|(name, _)| *name));
        for row in rows {
            let cells = row.cells();
            out.push_str(&csv_line(cells.iter().map(String::as_str)));
        }
        out
    }

    /// Styled workbook: title, export stamp, header, zebra rows and a total row.
    pub fn to_xlsx<T: ExportRow>(rows: &[T]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(T::TITLE)?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let columns = T::COLUMNS;
        let last_col = (columns.len() - 1) as u16;

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, T::TITLE, &title_format)?;

        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 22)?;
        let stamp = chrono::Utc::now().format("%d %b %Y %H:%M UTC").to_string();
        let subtitle = format!("Exported {}  •  {} records", stamp, rows.len());
        worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 3;
        for (idx, record) in rows.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };
            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let first_fmt = base_fmt.clone().set_bold();

            worksheet.set_row_height(row, 22)?;
            for (col, value) in record.cells().iter().enumerate() {
                let fmt = if col == 0 { &first_fmt } else { &base_fmt };
                worksheet.write_string_with_format(row, col as u16, value, fmt)?;
            }
        }

        let total_row = data_start_row + rows.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        worksheet.set_row_height(total_row, 26)?;
        worksheet.merge_range(
            total_row,
            0,
            total_row,
            last_col,
            &format!("Total: {}", rows.len()),
            &summary_fmt,
        )?;

        worksheet.set_freeze_panes(3, 0)?;
        worksheet.autofilter(
            header_row,
            0,
            (data_start_row + rows.len() as u32).saturating_sub(1).max(header_row),
            last_col,
        )?;

        Ok(workbook.save_to_buffer()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;

    #[test]
    fn csv_quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("Ledger, Inc"), "\"Ledger, Inc\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let csv = ExportService::to_csv(&fixtures::candidates());
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Name,Email,"));
        assert!(lines[1].starts_with("Aisha Khan,"));
    }

    #[test]
    fn job_rows_show_currency_and_status() {
        let jobs = fixtures::jobs();
        let archived = jobs.iter().find(|j| j.is_archived).unwrap();
        assert_eq!(archived.cells()[6], "archived");
        assert_eq!(archived.cells()[5], "—");
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = ExportService::to_xlsx(&fixtures::employer_requests()).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let empty: Vec<JobPosting> = Vec::new();
        assert!(ExportService::to_xlsx(&empty).is_ok());
    }
}
