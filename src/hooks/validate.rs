use crate::error::{RecordError, Result};
use crate::signals::{Reaction, Receiver, Signal};
use crate::state::data::Student;

/// Rejects students with an empty name before they are written
#[derive(Debug, Default, Clone, Copy)]
pub struct NameValidator;

impl Receiver<Student> for NameValidator {
    fn name(&self) -> &'static str {
        "name_validator"
    }

    fn receive(&self, signal: &mut Signal<'_, Student>) -> Result<Reaction> {
        if let Signal::PreSave { instance } = signal {
            if instance.name.is_empty() {
                return Err(RecordError::Validation(
                    "Student name cannot be empty.".to_string(),
                ));
            }
        }
        Ok(Reaction::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::Gender;

    #[test]
    fn test_rejects_empty_name() {
        let student = Student::new("", Gender::Male);
        let result = NameValidator.receive(&mut Signal::PreSave { instance: &student });
        assert!(matches!(result, Err(RecordError::Validation(_))));
    }

    #[test]
    fn test_accepts_whitespace_name() {
        let student = Student::new("   ", Gender::Male);
        let result = NameValidator.receive(&mut Signal::PreSave { instance: &student });
        assert_eq!(result.unwrap(), Reaction::Unchanged);
    }

    #[test]
    fn test_accepts_named_student() {
        let student = Student::new("Bob", Gender::Male);
        let result = NameValidator.receive(&mut Signal::PreSave { instance: &student });
        assert_eq!(result.unwrap(), Reaction::Unchanged);
    }
}
