pub use crate::config::*;

use std::collections::HashMap;

/// A builder for collecting the answers of a user.
///
/// The builder checks every answer against the theses of the questionnaire.
///
/// ```
/// pub use voting_advice::builder::Builder;
/// pub use voting_advice::Thesis;
/// # use voting_advice::AnswerError;
///
/// let theses = vec![Thesis {
///     id: "t1".to_string(),
///     issue_id: "economy".to_string(),
///     text: "Taxes should be lower.".to_string(),
///     scale_min: -2.0,
///     scale_max: 2.0,
///     order: 1,
///     is_active: true,
/// }];
///
/// let mut builder = Builder::new(&theses)?;
/// builder.answer("t1", 2.0, 3)?;
/// let answers = builder.build();
/// assert_eq!(answers.len(), 1);
///
/// # Ok::<(), AnswerError>(())
/// ```
pub struct Builder {
    pub(crate) _scales: HashMap<String, (f64, f64)>,
    pub(crate) _answers: Vec<UserAnswer>,
}

impl Builder {
    pub fn new(theses: &[Thesis]) -> Result<Builder, AnswerError> {
        let mut scales: HashMap<String, (f64, f64)> = HashMap::new();
        for t in theses.iter() {
            scales
                .entry(t.id.clone())
                .or_insert((t.scale_min, t.scale_max));
        }
        Ok(Builder {
            _scales: scales,
            _answers: Vec::new(),
        })
    }

    /// Records the answer to a thesis.
    ///
    /// weight: how important the thesis is to the user, from 1 to 3. A weight of 0 skips the thesis.
    /// Answering a thesis again replaces the previous answer.
    pub fn answer(&mut self, thesis_id: &str, value: f64, weight: u8) -> Result<(), AnswerError> {
        let (scale_min, scale_max) = *self
            ._scales
            .get(thesis_id)
            .ok_or_else(|| AnswerError::UnknownThesis(thesis_id.to_string()))?;
        if !(scale_min..=scale_max).contains(&value) {
            return Err(AnswerError::ValueOutOfRange {
                thesis_id: thesis_id.to_string(),
                value,
            });
        }
        if weight > 3 {
            return Err(AnswerError::InvalidWeight {
                thesis_id: thesis_id.to_string(),
                weight,
            });
        }
        self.push_answer(UserAnswer {
            thesis_id: thesis_id.to_string(),
            value,
            weight,
        });
        Ok(())
    }

    /// Skips a thesis. It will not count for any party.
    pub fn skip(&mut self, thesis_id: &str) -> Result<(), AnswerError> {
        self.answer(thesis_id, 0.0, 0)
    }

    /// Records an existing answer, with the same checks as [Builder::answer].
    pub fn add_answer(&mut self, answer: &UserAnswer) -> Result<(), AnswerError> {
        self.answer(&answer.thesis_id, answer.value, answer.weight)
    }

    fn push_answer(&mut self, answer: UserAnswer) {
        match self
            ._answers
            .iter_mut()
            .find(|a| a.thesis_id == answer.thesis_id)
        {
            Some(previous) => *previous = answer,
            None => self._answers.push(answer),
        }
    }

    /// The answers, in the order in which the theses were first answered.
    pub fn build(self) -> Vec<UserAnswer> {
        self._answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theses() -> Vec<Thesis> {
        ["t1", "t2"]
            .iter()
            .map(|id| Thesis {
                id: id.to_string(),
                issue_id: "economy".to_string(),
                text: String::new(),
                scale_min: -2.0,
                scale_max: 2.0,
                order: 0,
                is_active: true,
            })
            .collect()
    }

    #[test]
    fn answers_keep_their_order() {
        let mut builder = Builder::new(&theses()).unwrap();
        builder.answer("t2", -1.0, 1).unwrap();
        builder.skip("t1").unwrap();
        builder.answer("t2", 2.0, 3).unwrap();

        let answers = builder.build();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].thesis_id, "t2");
        assert_eq!(answers[0].value, 2.0);
        assert_eq!(answers[0].weight, 3);
        assert!(answers[1].is_skipped());
    }

    #[test]
    fn invalid_answers_are_rejected() {
        let mut builder = Builder::new(&theses()).unwrap();
        assert_eq!(
            builder.answer("t9", 1.0, 1),
            Err(AnswerError::UnknownThesis("t9".to_string()))
        );
        assert!(matches!(
            builder.answer("t1", 2.5, 1),
            Err(AnswerError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            builder.answer("t1", 1.0, 4),
            Err(AnswerError::InvalidWeight { weight: 4, .. })
        ));
        assert!(builder.build().is_empty());
    }

    #[test]
    fn added_answers_are_checked() {
        let mut builder = Builder::new(&theses()).unwrap();
        let unknown = UserAnswer {
            thesis_id: "nope".to_string(),
            value: 9.0,
            weight: 200,
        };
        assert_eq!(
            builder.add_answer(&unknown),
            Err(AnswerError::UnknownThesis("nope".to_string()))
        );
        let too_heavy = UserAnswer {
            thesis_id: "t1".to_string(),
            value: 1.0,
            weight: 200,
        };
        assert!(builder.add_answer(&too_heavy).is_err());
        let out_of_scale = UserAnswer {
            thesis_id: "t2".to_string(),
            value: 9.0,
            weight: 1,
        };
        assert!(builder.add_answer(&out_of_scale).is_err());
        let valid = UserAnswer {
            thesis_id: "t2".to_string(),
            value: -2.0,
            weight: 2,
        };
        assert_eq!(builder.add_answer(&valid), Ok(()));

        assert_eq!(builder.build(), vec![valid]);
    }
}
