//! User-facing texts. Everything here is a pure function of its arguments.

use crate::quiz::bank::QuestionBank;
use crate::quiz::controller::ControllerError;
use crate::quiz::scoring::{Scores, StrategyScore};
use crate::quiz::session::Stats;
use crate::quiz::{Question, MAX_ANSWER, MIN_ANSWER};

pub const DEFAULT_USER_NAME: &str = "гость";

const BAR_WIDTH: usize = 10;
const FILLED: char = '▓';
const EMPTY: char = '░';

pub const REFLECTION_BUTTON: &str = "Получить файл-рефлексию";
pub const RETRY_LATER: &str =
    "Произошла ошибка. Пожалуйста, попробуйте позже или свяжитесь с администратором.";

pub const ENCOURAGEMENT_MESSAGES: [&str; 9] = [
    "Отлично! Продолжаем...",
    "Хороший ответ! Идём дальше...",
    "Ты молодец! Следующий вопрос...",
    "Интересный выбор! Двигаемся дальше...",
    "Уже почти половина пройдена! Продолжай в том же духе...",
    "Замечательно справляешься! Продолжим...",
    "Осталось совсем немного! Ты прекрасно справляешься...",
    "Каждый ответ приближает нас к пониманию твоих стратегий...",
    "Отлично продвигаемся! Следующий вопрос...",
];

/// `[▓▓▓░░░░░░░] 30%` for the third question out of ten.
pub fn progress_bar(index: usize, total: usize) -> String {
    if total == 0 {
        return format!("[{}] 0%", EMPTY.to_string().repeat(BAR_WIDTH));
    }
    let done = (index + 1).min(total) as f64 / total as f64;
    let filled = ((BAR_WIDTH as f64) * done).round() as usize;
    let percent = (100.0 * done).round() as usize;

    let bar: String = std::iter::repeat(FILLED)
        .take(filled)
        .chain(std::iter::repeat(EMPTY).take(BAR_WIDTH - filled))
        .collect();
    format!("[{}] {}%", bar, percent)
}

pub fn question_text(index: usize, total: usize, question: &Question) -> String {
    format!(
        "Вопрос {}/{}:\n{}\n\nПрогресс: {}",
        index + 1,
        total,
        question.text,
        progress_bar(index, total)
    )
}

pub fn welcome_message(user_name: &str) -> String {
    format!(
        "👋 Привет, {}!\n\n\
        Этот тест поможет тебе определить твои основные стратегии поведения в стрессовых ситуациях.\n\
        Тебе предстоит ответить на несколько вопросов, оценивая каждое утверждение по шкале от {} до {}:\n\n\
        1 - Почти никогда\n\
        2 - Редко\n\
        3 - Иногда\n\
        4 - Часто\n\
        5 - Почти всегда\n\n\
        Если захочешь вернуться к текущему вопросу, нажми /next.",
        user_name, MIN_ANSWER, MAX_ANSWER
    )
}

pub fn processing_message(percent: usize) -> String {
    format!("Обработка результатов... {}%", percent)
}

pub fn reflection_message() -> &'static str {
    "Спасибо за интерес к материалам! Файл-рефлексия поможет поработать с твоими стратегиями \
    и определить свои приоритеты. Следи за обновлениями в нашем канале!"
}

pub fn stats_message(stats: &Stats, user_name: &str) -> String {
    format!(
        "📊 {}, вот статистика использования бота:\n\n\
        Всего пользователей: {}\n\
        Начато тестов: {}\n\
        Завершенных тестов: {}",
        user_name, stats.active_users, stats.total_sessions, stats.completed_sessions
    )
}

/// "решение проблем" -> "Решение Проблем"
fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            result.push(c);
            word_start = true;
        }
    }
    result
}

pub fn results_message(
    scores: &Scores,
    dominant: &StrategyScore,
    bank: &QuestionBank,
    user_name: &str,
) -> String {
    let mut message = format!("👋 {}, спасибо, что прошел тест!\n\n", user_name);
    message.push_str(
        "Ты используешь разные стратегии поведения, и это здорово! Вот как они распределились:\n\n",
    );

    for score in scores.ranked() {
        message.push_str(&format!(
            "{} {}: {:.1}%\n",
            bank.symbol(&score.strategy),
            title_case(score.strategy.as_str()),
            score.percentage
        ));
    }

    message.push_str(&format!(
        "\nТы чаще всего обращаешься к стратегии '{}' ({:.1}%). \
        Это говорит о том, что в стрессовых ситуациях ты склонен {}.\n\n",
        dominant.strategy,
        dominant.percentage,
        bank.description(&dominant.strategy)
    ));

    message.push_str(
        "Помни: не существует \"правильных\" или \"неправильных\" стратегий. \
        Каждая из них может быть адаптивна в определенных обстоятельствах. \
        Важно осознавать разные инструменты и уметь их гибко применять в зависимости от ситуации.",
    );
    message
}

pub fn error_message(error: &ControllerError, user_name: &str) -> String {
    match error {
        ControllerError::SessionNotFound => {
            format!("{}, пожалуйста, начни тест с команды /start", user_name)
        }
        ControllerError::NoQuestions => {
            "Сейчас нет доступных вопросов. Пожалуйста, попробуйте позже.".to_string()
        }
        ControllerError::InvalidAnswer(_) => format!(
            "Пожалуйста, выбери ответ от {} до {}.",
            MIN_ANSWER, MAX_ANSWER
        ),
        ControllerError::AlreadyCompleted => format!(
            "{}, ты уже прошел тест. Чтобы пройти его заново, нажми /start",
            user_name
        ),
        ControllerError::Forbidden => {
            format!("{}, у тебя нет доступа к этой команде.", user_name)
        }
        ControllerError::NothingAnswered => format!(
            "{}, ты не ответил ни на один вопрос, поэтому результат посчитать нельзя. \
            Начни тест заново с команды /start",
            user_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::quiz::bank::tests::SAMPLE_BANK;
    use crate::quiz::scoring::score;
    use crate::quiz::AnswerValue;

    #[test]
    fn progress_bar_third_of_ten() {
        assert_eq!(progress_bar(2, 10), "[▓▓▓░░░░░░░] 30%");
    }

    #[test]
    fn progress_bar_rounds() {
        // 1/3 -> 3.33 filled, 33%
        assert_eq!(progress_bar(0, 3), "[▓▓▓░░░░░░░] 33%");
        // 2/3 -> 6.67 filled, 67%
        assert_eq!(progress_bar(1, 3), "[▓▓▓▓▓▓▓░░░] 67%");
        assert_eq!(progress_bar(2, 3), "[▓▓▓▓▓▓▓▓▓▓] 100%");
    }

    #[test]
    fn progress_bar_with_no_questions() {
        assert_eq!(progress_bar(0, 0), "[░░░░░░░░░░] 0%");
    }

    #[test]
    fn question_text_has_number_and_progress() {
        let question = Question::new(4, "Я ищу поддержку у друзей", crate::quiz::Strategy::new("x"));
        let text = question_text(2, 10, &question);
        assert!(text.starts_with("Вопрос 3/10:\nЯ ищу поддержку у друзей"));
        assert!(text.ends_with("[▓▓▓░░░░░░░] 30%"));
    }

    #[test]
    fn title_case_handles_hyphens_and_spaces() {
        assert_eq!(title_case("решение проблем"), "Решение Проблем");
        assert_eq!(
            title_case("эмоционально-ориентированная"),
            "Эмоционально-Ориентированная"
        );
    }

    #[test]
    fn results_message_lists_strategies_highest_first() {
        let bank = QuestionBank::from_json(SAMPLE_BANK).unwrap();
        let answers: BTreeMap<u32, AnswerValue> = [(1, 1), (2, 5), (3, 1)]
            .into_iter()
            .map(|(id, v)| (id, AnswerValue::new(v).unwrap()))
            .collect();
        let scores = score(&answers, bank.questions());
        let dominant = scores.dominant().unwrap();

        let message = results_message(&scores, dominant, &bank, "Зоя");

        let solving = message.find("• Решение Проблем: 100.0%").unwrap();
        let avoidance = message.find("◆ Избегание: 20.0%").unwrap();
        assert!(solving < avoidance);
        assert!(message.starts_with("👋 Зоя"));
        assert!(message.contains("'решение проблем' (100.0%)"));
        assert!(message.contains("склонен искать практический выход из ситуации."));
    }

    #[test]
    fn stats_message_shows_counts() {
        let stats = Stats {
            total_sessions: 3,
            completed_sessions: 1,
            active_users: 2,
        };
        let message = stats_message(&stats, "admin");
        assert!(message.contains("Всего пользователей: 2"));
        assert!(message.contains("Начато тестов: 3"));
        assert!(message.contains("Завершенных тестов: 1"));
    }

    #[test]
    fn session_not_found_asks_to_start() {
        let message = error_message(&ControllerError::SessionNotFound, "Оля");
        assert_eq!(message, "Оля, пожалуйста, начни тест с команды /start");
    }
}
