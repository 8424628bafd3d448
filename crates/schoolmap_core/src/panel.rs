//! Detail panel for the selected school.
//!
//! Pure function of the current selection; holds no state of its own.

use crate::model::school::School;
use std::fmt::{Display, Formatter};

/// One labelled line of the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub label: &'static str,
    pub value: String,
}

/// Rendered panel contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailView {
    Placeholder { school_count: usize },
    School { title: String, fields: Vec<DetailField> },
}

/// Renders the panel for `selected`, or a hint when nothing is selected.
pub fn render_detail(selected: Option<&School>, school_count: usize) -> DetailView {
    let Some(school) = selected else {
        return DetailView::Placeholder { school_count };
    };

    let mut fields = vec![
        DetailField {
            label: "Level",
            value: school.school_level.clone(),
        },
        DetailField {
            label: "Address",
            value: school.address.clone(),
        },
    ];
    if let Some(phone) = school
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
    {
        fields.push(DetailField {
            label: "Phone",
            value: phone.to_string(),
        });
    }

    DetailView::School {
        title: school.school_name.clone(),
        fields,
    }
}

impl Display for DetailView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placeholder { school_count } => {
                writeln!(f, "Click a marker on the map to see school details.")?;
                write!(f, "({school_count} schools)")
            }
            Self::School { title, fields } => {
                write!(f, "{title}")?;
                for field in fields {
                    write!(f, "\n  {}: {}", field.label, field.value)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{render_detail, DetailView};
    use crate::model::school::{GeoPoint, School};
    use uuid::Uuid;

    fn school(phone: Option<&str>) -> School {
        School {
            id: Uuid::new_v4(),
            school_name: "Busan Harbor Middle".to_string(),
            school_level: "middle".to_string(),
            address: "12 Harbor-ro, Busan".to_string(),
            phone_number: phone.map(str::to_string),
            location: GeoPoint::point(129.0, 35.1),
        }
    }

    #[test]
    fn placeholder_reports_school_count() {
        let view = render_detail(None, 42);
        assert_eq!(view, DetailView::Placeholder { school_count: 42 });
        assert!(view.to_string().contains("(42 schools)"));
    }

    #[test]
    fn phone_line_only_when_present() {
        let with_phone = render_detail(Some(&school(Some("051-000-0000"))), 1);
        let DetailView::School { title, fields } = &with_phone else {
            panic!("expected school view");
        };
        assert_eq!(title, "Busan Harbor Middle");
        assert_eq!(
            fields.iter().map(|field| field.label).collect::<Vec<_>>(),
            ["Level", "Address", "Phone"]
        );

        for phone in [None, Some(""), Some("  ")] {
            let DetailView::School { fields, .. } = render_detail(Some(&school(phone)), 1) else {
                panic!("expected school view");
            };
            assert!(fields.iter().all(|field| field.label != "Phone"));
        }
    }
}
