use shared::{
    domain::{CandidateForm, NewCandidate},
    error::{FormField, ValidationError},
};
use url::Url;

pub const MIN_TEXT_CHARS: usize = 2;
pub const MAX_TEXT_CHARS: usize = 100;
pub const MAX_EXPERIENCE_YEARS: f64 = 50.0;

/// Checks every field of the add-candidate form and returns either a
/// normalized [`NewCandidate`] or all field errors at once.
pub fn validate(form: CandidateForm) -> Result<NewCandidate, ValidationError> {
    let mut errors = ValidationError::default();

    let name = form.name.trim().to_string();
    check_text(&mut errors, FormField::Name, "Name", &name);

    let role = form.role.trim().to_string();
    check_text(&mut errors, FormField::Role, "Role", &role);

    if !form.experience.is_finite() {
        errors.push(FormField::Experience, "Experience must be a number");
    } else if form.experience < 0.0 {
        errors.push(FormField::Experience, "Experience cannot be negative");
    } else if form.experience > MAX_EXPERIENCE_YEARS {
        errors.push(FormField::Experience, "Experience cannot exceed 50 years");
    }

    let resume_link = form
        .resume_link
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string);
    if let Some(link) = resume_link.as_deref() {
        if !is_web_url(link) {
            errors.push(FormField::ResumeLink, "Must be a valid URL");
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewCandidate {
        name,
        role,
        experience: form.experience,
        resume_link,
        status: form.status.unwrap_or_default(),
    })
}

fn is_web_url(link: &str) -> bool {
    Url::parse(link)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn check_text(errors: &mut ValidationError, field: FormField, label: &str, value: &str) {
    let chars = value.chars().count();
    if chars < MIN_TEXT_CHARS {
        errors.push(
            field,
            format!("{label} must be at least {MIN_TEXT_CHARS} characters"),
        );
    } else if chars > MAX_TEXT_CHARS {
        errors.push(
            field,
            format!("{label} must be less than {MAX_TEXT_CHARS} characters"),
        );
    }
}
