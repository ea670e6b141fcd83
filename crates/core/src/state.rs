//! Learner-facing application state and its reducer.
//!
//! `reduce` is pure: services perform the I/O and feed results back in as actions.

use serde::{Deserialize, Serialize};

use crate::grading::{QuizSubmission, apply_submission};
use crate::model::{ChapterId, Course, CourseId, QuizAttempt, User};

/// Number of rotating status messages shown while a course is generated.
pub const LOADING_STEP_COUNT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Auth,
    Idle,
    Generating,
    Playing,
}

/// One-shot message for the learner, cleared by the next meaningful action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    CourseCompleted { course_id: CourseId },
    GenerationFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub phase: Phase,
    pub user: Option<User>,
    /// Library in creation order; new courses go at the end.
    pub courses: Vec<Course>,
    pub active_course: Option<CourseId>,
    pub active_chapter: Option<ChapterId>,
    pub loading_step: u8,
    pub notice: Option<Notice>,
}

impl AppState {
    #[must_use]
    pub fn current_course(&self) -> Option<&Course> {
        let id = self.active_course.as_ref()?;
        self.courses.iter().find(|c| &c.course_id == id)
    }

    fn current_course_mut(&mut self) -> Option<&mut Course> {
        let id = self.active_course.clone()?;
        self.courses.iter_mut().find(|c| c.course_id == id)
    }

    fn open(&mut self, course_id: CourseId) {
        let first = self
            .courses
            .iter()
            .find(|c| c.course_id == course_id)
            .and_then(|c| c.chapters.first())
            .map(|c| c.id);
        self.active_course = Some(course_id);
        self.active_chapter = first;
        self.phase = Phase::Playing;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoggedIn { user: User, courses: Vec<Course> },
    LoggedOut,
    ProfileSaved(User),
    NewCourse,
    GenerationStarted,
    GenerationTick,
    CourseGenerated(Course),
    GenerationFailed(String),
    CourseSelected(CourseId),
    ChapterOpened(ChapterId),
    QuizCompleted {
        chapter_id: ChapterId,
        attempt: QuizAttempt,
    },
}

/// Advance `state` by one action.
///
/// Everything except `LoggedIn` is ignored while signed out. Selections that
/// reference unknown courses or chapters leave the state unchanged.
#[must_use]
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    if state.user.is_none() && !matches!(action, Action::LoggedIn { .. }) {
        return state;
    }

    match action {
        Action::LoggedIn { user, courses } => {
            return AppState {
                phase: Phase::Idle,
                user: Some(user),
                courses,
                ..AppState::default()
            };
        }
        Action::LoggedOut => return AppState::default(),
        Action::ProfileSaved(user) => state.user = Some(user),
        Action::NewCourse => {
            state.active_course = None;
            state.active_chapter = None;
            state.notice = None;
            state.phase = Phase::Idle;
        }
        Action::GenerationStarted => {
            state.phase = Phase::Generating;
            state.loading_step = 0;
            state.notice = None;
        }
        Action::GenerationTick => {
            if state.phase == Phase::Generating {
                state.loading_step = (state.loading_step + 1) % LOADING_STEP_COUNT;
            }
        }
        Action::CourseGenerated(course) => {
            let id = course.course_id.clone();
            state.courses.push(course);
            state.loading_step = 0;
            state.open(id);
        }
        Action::GenerationFailed(message) => {
            state.phase = Phase::Idle;
            state.loading_step = 0;
            state.notice = Some(Notice::GenerationFailed { message });
        }
        Action::CourseSelected(course_id) => {
            if state.courses.iter().any(|c| c.course_id == course_id) {
                state.notice = None;
                state.open(course_id);
            }
        }
        Action::ChapterOpened(chapter_id) => {
            if state
                .current_course()
                .is_some_and(|c| c.chapter(chapter_id).is_some())
            {
                state.active_chapter = Some(chapter_id);
            }
        }
        Action::QuizCompleted {
            chapter_id,
            attempt,
        } => complete_quiz(&mut state, chapter_id, attempt),
    }
    state
}

fn complete_quiz(state: &mut AppState, chapter_id: ChapterId, attempt: QuizAttempt) {
    if state.phase != Phase::Playing {
        return;
    }
    let Some(course) = state.current_course_mut() else {
        return;
    };
    if course.chapter(chapter_id).is_none() {
        return;
    }

    let submission = QuizSubmission::from_attempt(chapter_id, &attempt);
    course.progress = Some(apply_submission(course, submission));
    course.record_answers(chapter_id, attempt.into_answers());

    match course.next_chapter(chapter_id).map(|c| c.id) {
        Some(next) => state.active_chapter = Some(next),
        None => {
            let course_id = course.course_id.clone();
            state.notice = Some(Notice::CourseCompleted { course_id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::course;

    fn signed_in() -> AppState {
        reduce(
            AppState::default(),
            Action::LoggedIn {
                user: User::new("ada").unwrap(),
                courses: vec![course("c1", &[5, 5])],
            },
        )
    }

    fn answer_all(state: &AppState, chapter: u32, right: usize) -> QuizAttempt {
        let course = state.current_course().unwrap();
        let quiz = &course.chapter(ChapterId::new(chapter)).unwrap().quiz;
        let selections: Vec<Option<usize>> = quiz
            .iter()
            .enumerate()
            .map(|(i, q)| {
                if i < right {
                    Some(q.correct_answer)
                } else {
                    Some((q.correct_answer + 1) % q.options.len())
                }
            })
            .collect();
        QuizAttempt::grade(quiz, &selections)
    }

    #[test]
    fn actions_are_ignored_until_login() {
        let state = reduce(AppState::default(), Action::GenerationStarted);
        assert_eq!(state.phase, Phase::Auth);

        let state = signed_in();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.courses.len(), 1);
    }

    #[test]
    fn logout_clears_everything() {
        let state = reduce(signed_in(), Action::CourseSelected(CourseId::new("c1")));
        let state = reduce(state, Action::LoggedOut);
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn loading_step_cycles_while_generating() {
        let mut state = reduce(signed_in(), Action::GenerationStarted);
        for _ in 0..6 {
            state = reduce(state, Action::GenerationTick);
        }
        assert_eq!(state.loading_step, 1);

        let idle = reduce(signed_in(), Action::GenerationTick);
        assert_eq!(idle.loading_step, 0);
    }

    #[test]
    fn generated_course_is_appended_and_opened() {
        let state = reduce(signed_in(), Action::GenerationStarted);
        let state = reduce(state, Action::CourseGenerated(course("c2", &[5, 5, 5])));
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.courses.last().unwrap().course_id, CourseId::new("c2"));
        assert_eq!(state.active_chapter, Some(ChapterId::new(1)));
    }

    #[test]
    fn failed_generation_returns_to_idle_with_notice() {
        let state = reduce(signed_in(), Action::GenerationStarted);
        let state = reduce(state, Action::GenerationFailed("boom".into()));
        assert_eq!(state.phase, Phase::Idle);
        assert!(matches!(state.notice, Some(Notice::GenerationFailed { .. })));
    }

    #[test]
    fn unknown_selections_are_ignored() {
        let state = reduce(signed_in(), Action::CourseSelected(CourseId::new("nope")));
        assert_eq!(state.phase, Phase::Idle);

        let state = reduce(state, Action::CourseSelected(CourseId::new("c1")));
        let state = reduce(state, Action::ChapterOpened(ChapterId::new(9)));
        assert_eq!(state.active_chapter, Some(ChapterId::new(1)));
    }

    #[test]
    fn completing_quizzes_advances_then_flags_completion() {
        let state = reduce(signed_in(), Action::CourseSelected(CourseId::new("c1")));

        let attempt = answer_all(&state, 1, 3);
        let state = reduce(
            state,
            Action::QuizCompleted {
                chapter_id: ChapterId::new(1),
                attempt,
            },
        );
        assert_eq!(state.active_chapter, Some(ChapterId::new(2)));
        let progress = state.current_course().unwrap().progress.clone().unwrap();
        assert_eq!(progress.percent_complete, 50);
        assert_eq!(progress.overall_grade, 60);
        assert!(state.current_course().unwrap().has_quiz_history());

        let attempt = answer_all(&state, 2, 5);
        let state = reduce(
            state,
            Action::QuizCompleted {
                chapter_id: ChapterId::new(2),
                attempt,
            },
        );
        assert_eq!(
            state.notice,
            Some(Notice::CourseCompleted {
                course_id: CourseId::new("c1")
            })
        );
        let progress = state.current_course().unwrap().progress.clone().unwrap();
        assert_eq!(progress.overall_grade, 80);
    }

    #[test]
    fn state_serializes() {
        let state = signed_in();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "IDLE");
        let back: AppState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
