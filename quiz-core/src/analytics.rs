use quiz_types::{
    AnalyticsReport, AnswerEvent, AreaCount, Difficulty, DifficultyAccuracy, Insight, InsightKind,
    PerformanceLedger, QuestionRecord,
};

/// Questions at or above this mastery level count as mastered
pub const MASTERY_MASTERED_LEVEL: u8 = 4;

pub struct AnalyticsEngine;

impl AnalyticsEngine {
    /// Fold one resolved answer into the ledger
    pub fn record_outcome(ledger: &mut PerformanceLedger, event: AnswerEvent) {
        ledger.total_questions += 1;
        if event.is_correct {
            ledger.correct_answers += 1;
            bump_area(&mut ledger.strong_areas, &event.question);
        } else {
            ledger.incorrect_answers += 1;
            bump_area(&mut ledger.weak_areas, &event.question);
        }

        ledger
            .difficulty_stats
            .bucket_mut(event.difficulty)
            .record(event.is_correct);
        ledger.history.push(event);
    }

    /// Rule-based insights over a ledger.
    /// Rules fire independently and in a fixed order so output is reproducible;
    /// the mastery summary is always appended last.
    pub fn generate_insights(
        ledger: &PerformanceLedger,
        questions: &[QuestionRecord],
    ) -> (Vec<Insight>, Vec<String>) {
        let mut insights = Vec::new();
        let mut recommendations = Vec::new();

        let easy = ledger.difficulty_stats.bucket(Difficulty::Easy);
        let medium = ledger.difficulty_stats.bucket(Difficulty::Medium);
        let hard = ledger.difficulty_stats.bucket(Difficulty::Hard);

        if easy.total >= 5 && easy.accuracy() >= 0.8 {
            insights.push(Insight {
                kind: InsightKind::EasyProficiency,
                message: format!(
                    "Strong grasp of easy questions ({:.0}% accuracy)",
                    easy.accuracy() * 100.0
                ),
            });
            recommendations.push("Try focusing on medium difficulty questions".to_string());
        }

        if medium.total >= 5 && medium.accuracy() >= 0.7 {
            insights.push(Insight {
                kind: InsightKind::MediumProgress,
                message: format!(
                    "Solid progress on medium questions ({:.0}% accuracy)",
                    medium.accuracy() * 100.0
                ),
            });
            recommendations.push("You're ready for harder challenges".to_string());
        }

        if easy.total >= 3 && easy.accuracy() < 0.6 {
            insights.push(Insight {
                kind: InsightKind::EasyRemediation,
                message: format!(
                    "Easy questions need another look ({:.0}% accuracy)",
                    easy.accuracy() * 100.0
                ),
            });
            recommendations.push("Focus on mastering the fundamentals first".to_string());
        }

        if hard.total >= 3 && hard.accuracy() < 0.4 {
            insights.push(Insight {
                kind: InsightKind::HardReassurance,
                message: format!(
                    "Hard questions are tough for everyone ({:.0}% accuracy)",
                    hard.accuracy() * 100.0
                ),
            });
            recommendations
                .push("Build up through medium questions before retrying hard ones".to_string());
        }

        let mastery_percent = Self::mastery_percent(questions);
        insights.push(Insight {
            kind: InsightKind::MasterySummary,
            message: format!("You've mastered {:.0}% of this question set", mastery_percent),
        });
        recommendations.push(if mastery_percent >= 80.0 {
            "Outstanding mastery, look for a harder question set".to_string()
        } else if mastery_percent >= 50.0 {
            "Good progress, keep reviewing the questions you miss".to_string()
        } else {
            "Regular review sessions will build mastery fastest".to_string()
        });

        (insights, recommendations)
    }

    /// Share of questions at or above the mastered level, as a percentage
    pub fn mastery_percent(questions: &[QuestionRecord]) -> f64 {
        if questions.is_empty() {
            return 0.0;
        }
        let mastered = questions
            .iter()
            .filter(|q| q.mastery_level >= MASTERY_MASTERED_LEVEL)
            .count();
        mastered as f64 / questions.len() as f64 * 100.0
    }

    /// Digest a ledger for the results screen and the analytics endpoint
    pub fn generate_report(
        ledger: &PerformanceLedger,
        questions: &[QuestionRecord],
    ) -> AnalyticsReport {
        let (insights, recommendations) = Self::generate_insights(ledger, questions);

        AnalyticsReport {
            total_questions: ledger.total_questions,
            correct_answers: ledger.correct_answers,
            accuracy: ledger.accuracy(),
            difficulty_accuracy: DifficultyAccuracy {
                easy: ledger.difficulty_stats.easy.accuracy(),
                medium: ledger.difficulty_stats.medium.accuracy(),
                hard: ledger.difficulty_stats.hard.accuracy(),
            },
            weak_areas: top_areas(&ledger.weak_areas, 5),
            strong_areas: top_areas(&ledger.strong_areas, 3),
            mastery_percent: Self::mastery_percent(questions),
            insights,
            recommendations,
        }
    }
}

fn bump_area(areas: &mut Vec<AreaCount>, question: &str) {
    if let Some(area) = areas.iter_mut().find(|area| area.question == question) {
        area.count += 1;
    } else {
        areas.push(AreaCount {
            question: question.to_string(),
            count: 1,
        });
    }
}

// Highest counts first; the sort is stable so ties keep first-seen order
fn top_areas(areas: &[AreaCount], limit: usize) -> Vec<AreaCount> {
    let mut ranked = areas.to_vec();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}
