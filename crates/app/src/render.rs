//! Plain-text output for the CLI. Everything goes to stdout.

use services::{AdminDashboard, QuizOutcome};
use signal_core::insights::Latest;
use signal_core::model::{Course, Remediation};
use signal_core::time::format_timestamp;

fn latest_value(latest: Option<&Latest>) -> &str {
    latest.map_or("–", |l| l.value.as_str())
}

fn progress_line(course: &Course) -> String {
    match &course.progress {
        Some(p) => format!("{}% complete, grade {}", p.percent_complete, p.overall_grade),
        None => "not started".to_owned(),
    }
}

pub fn dashboard(dashboard: &AdminDashboard) {
    println!("Learners ({})", dashboard.users.len());
    for user in &dashboard.users {
        let last_login = user.last_login.as_ref().map(|l| l.value.as_str());
        println!(
            "  {}  last login: {}  courses: {}",
            user.username,
            format_timestamp(last_login),
            user.courses.len()
        );
        println!(
            "    last topic: {}  last search: {}",
            latest_value(user.last_topic.as_ref()),
            latest_value(user.last_search.as_ref())
        );
        for gap in &user.top_gaps {
            println!(
                "    gap: {} / ch{} {} ({}%)",
                gap.course_title, gap.chapter_id, gap.chapter_title, gap.score_percent
            );
        }
    }

    println!();
    println!("Recent logins");
    for entry in &dashboard.recent_logins {
        println!(
            "  {}  {}",
            format_timestamp(Some(&entry.timestamp)),
            entry.user()
        );
    }

    println!();
    println!("Recent topics");
    for topic in &dashboard.recent_topics {
        println!(
            "  {}  {} [{}] {}",
            format_timestamp(Some(&topic.timestamp)),
            topic.user,
            topic.event_type,
            topic.topic
        );
    }
}

pub fn course_list(courses: &[Course]) {
    if courses.is_empty() {
        println!("No courses yet.");
        return;
    }
    for course in courses {
        println!(
            "{}  {}  ({})",
            course.course_id,
            course.title,
            progress_line(course)
        );
    }
}

pub fn course_created(course: &Course) {
    println!("Created {} \"{}\"", course.course_id, course.title);
    for chapter in &course.chapters {
        println!("  ch{} {} ({} questions)", chapter.id, chapter.title, chapter.quiz.len());
    }
    if let Some(verification) = &course.verification {
        println!(
            "  verification: {} {}/100{}",
            verification.status().as_str(),
            verification.score(),
            if verification.refined() { " (refined)" } else { "" }
        );
    }
}

pub fn quiz_outcome(outcome: &QuizOutcome) {
    println!(
        "Score {}/{}{}",
        outcome.attempt.score(),
        outcome.attempt.question_count(),
        if outcome.attempt.is_mastery() { " (mastered)" } else { "" }
    );
    println!("Course: {}", progress_line(&outcome.course));
    match outcome.next_chapter {
        Some(next) => println!("Next chapter: {next}"),
        None => println!("Course complete."),
    }
    if !outcome.attempt.is_mastery() {
        println!(
            "{} missed; run `remediate` for a follow-up quiz.",
            outcome.attempt.missed_questions().len()
        );
    }
}

pub fn remediation(remediation: &Remediation) {
    println!("{}", remediation.explanation());
    for (idx, question) in remediation.questions().iter().enumerate() {
        println!();
        println!("{}. {}", idx + 1, question.question);
        for (opt, text) in question.options.iter().enumerate() {
            println!("   [{opt}] {text}");
        }
    }
}
