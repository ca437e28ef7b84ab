use serde::Serialize;

use crate::models::assessment::Question;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionFeedback {
    pub index: usize,
    pub correct: bool,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Grade {
    /// Percentage of questions answered correctly, 0..=100.
    pub score: f64,
    pub passed: bool,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub feedback: Vec<QuestionFeedback>,
}

fn same_answer(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Grades answers positionally. Missing answers count as wrong; extra
/// answers are ignored.
pub fn grade(questions: &[Question], answers: &[String], passing_score: f64) -> Grade {
    let feedback: Vec<QuestionFeedback> = questions
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let given = answers.get(index);
            QuestionFeedback {
                index,
                correct: given.is_some_and(|a| same_answer(a, &q.correct_answer)),
                your_answer: given.cloned(),
                correct_answer: q.correct_answer.clone(),
                explanation: q.explanation.clone(),
            }
        })
        .collect();

    let correct_answers = feedback.iter().filter(|f| f.correct).count();
    let total_questions = questions.len();
    let score = if total_questions == 0 {
        0.0
    } else {
        let raw = correct_answers as f64 / total_questions as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    };

    Grade {
        score,
        passed: total_questions > 0 && score >= passing_score,
        total_questions,
        correct_answers,
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, answer: &str) -> Question {
        Question {
            question: text.to_string(),
            options: None,
            correct_answer: answer.to_string(),
            explanation: Some(format!("because {answer}")),
        }
    }

    #[test]
    fn test_answers_match_case_insensitively_after_trim() {
        let questions = vec![q("Keyword to filter rows?", "WHERE"), q("Joins two tables?", "JOIN")];
        let g = grade(&questions, &["  where ".into(), "join".into()], 70.0);
        assert_eq!(g.correct_answers, 2);
        assert_eq!(g.score, 100.0);
        assert!(g.passed);
    }

    #[test]
    fn test_missing_answers_are_wrong_and_score_rounds() {
        let questions = vec![q("a", "1"), q("b", "2"), q("c", "3")];
        let g = grade(&questions, &["1".into()], 70.0);
        assert_eq!(g.correct_answers, 1);
        assert_eq!(g.score, 33.33);
        assert!(!g.passed);
        assert_eq!(g.feedback[2].your_answer, None);
        assert!(!g.feedback[2].correct);
        assert_eq!(g.feedback[1].explanation.as_deref(), Some("because 2"));
    }

    #[test]
    fn test_pass_mark_is_inclusive() {
        let questions: Vec<Question> = (0..10).map(|i| q("x", &i.to_string())).collect();
        let answers: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        let g = grade(&questions, &answers, 70.0);
        assert_eq!(g.score, 70.0);
        assert!(g.passed);
    }
}
