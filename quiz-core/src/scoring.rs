pub struct ScoringEngine;

impl ScoringEngine {
    /// Points for a correct answer, given the timer reading and the streak
    /// held before this answer
    pub fn points_for_answer(time_left: u32, streak_before: u32) -> u32 {
        let mut points = 100; // Base award for a correct answer
        points += time_left.saturating_sub(5) * 2; // 2 points per second above the 5s floor
        points += streak_before * 5; // 5 points per consecutive correct so far
        points
    }

    /// Rating label for the results screen, relative to a baseline of
    /// 100 points per question in the session
    pub fn rating(score: u32, questions_total: usize) -> &'static str {
        if questions_total == 0 {
            return "KEEP TRYING!";
        }

        let percentage = score as f64 / questions_total as f64;
        if percentage >= 90.0 {
            "CHAMPION!"
        } else if percentage >= 80.0 {
            "EXCELLENT!"
        } else if percentage >= 70.0 {
            "GREAT JOB!"
        } else if percentage >= 60.0 {
            "GOOD WORK!"
        } else {
            "KEEP TRYING!"
        }
    }
}
