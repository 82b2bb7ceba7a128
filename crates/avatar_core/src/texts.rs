//! User-facing copy. All replies are in Russian.

use crate::domain::Gender;

pub const MENU_ENTER_DATE: &str = "📅 Ввести дату рождения";
pub const MENU_CONSULTATION: &str = "📞 Хочу консультацию";

/// Substrings that trigger the menu actions even when typed by hand.
pub const ENTER_DATE_TRIGGER: &str = "Ввести дату рождения";
pub const CONSULTATION_TRIGGER: &str = "Хочу консультацию";

pub const GENDER_MALE_BUTTON: &str = "Мужской ♂️";
pub const GENDER_FEMALE_BUTTON: &str = "Женский ♀️";
pub const DOWNLOAD_PDF_BUTTON: &str = "📄 Скачать PDF отчёт";
pub const DOWNLOAD_PDF_CALLBACK: &str = "download_pdf";
pub const SITE_BUTTON: &str = "Перейти на сайт";

pub const WELCOME: &str = "Привет
Я - бот метода «Аватар личности»
Здесь ты можешь бесплатно получить первичную расшифровку своих Аватаров по дате рождения.
Это не гадание и не случайный расчёт.
Это способ понять себя и свои жизненные сценарии.
Метод Аватаров – инструмент самопознания, основанный на дате рождения. Он сочетает психологические принципы, типирование личности, архетипы, IFS-терапию и коучинг.";

pub const REQUEST_BIRTH_DATE: &str = "📅 ЗАПРОС ДАТЫ РОЖДЕНИЯ

Введи дату рождения в формате:
День.Месяц.Год

Например: 15.03.1990

После ввода я покажу твои Аватары.";

pub const INVALID_DATE: &str = "Не получилось распознать дату.

Введи в формате: День.Месяц.Год
Пример: 25.12.2000";

pub const REQUEST_GENDER: &str = "Пожалуйста, выбери свой пол:";
pub const CHOOSE_GENDER_WITH_BUTTONS: &str = "Пожалуйста, выбери пол с помощью кнопок ниже.";
pub const ENTER_DATE_FIRST: &str = "Сначала введи дату рождения.";
pub const ENTER_DATE_AGAIN: &str = "Введи дату рождения ещё раз, затем нажми «Скачать PDF отчёт».";
pub const CONSULTATION_REPLY: &str = "Запись и полный разбор доступны на сайте 👇";

pub const CALCULATION_FAILED: &str = "Не удалось выполнить расчёт. Проверь дату рождения.";
pub const REPORT_FAILED: &str = "Не удалось сформировать отчёт. Введи дату заново.";
pub const REPORT_UNAVAILABLE: &str = "Генерация PDF временно недоступна. Попробуй позже.";
pub const REPORT_CAPTION: &str = "Твой отчёт по Аватарам личности 🌱";
pub const FOLLOW_UP: &str = "Хочешь сохранить расшифровку? Нажми кнопку ниже, и я пришлю PDF отчёт.";

pub const REPORT_HEADING: &str = "Расшифровка Аватаров личности";

pub const OVERVIEW: &str = "🔍 ЧТО ТЫ ПОЛУЧИШЬ ПОСЛЕ ВВОДА ДАТЫ И ВЫБОРА ПОЛА

После расчёта ты увидишь ключевые точки твоих Аватаров, которые сильнее всего влияют на жизнь здесь и сейчас.

ВАЖНО ЗНАТЬ

Этот бот даёт базовое понимание твоих Аватаров, твоей сути, чтобы ты:
• увидел(а) себя со стороны
• понял(а), почему в жизни всё складывается именно так
• получил(а) первые точки опоры

👉 Это не вся система, а её ключевая часть.
Глубинные причины, прогнозы, периоды, отношения и персональный план действий разбираются на консультациях.";

pub const WHAT_CAN_CHANGE: &str = "ЧТО МОЖЕТ ИЗМЕНИТЬСЯ ПОСЛЕ ЭТОГО РАЗБОРА

✔ станет больше ясности
✔ уменьшится внутреннее напряжение
✔ появится понимание, где ты идёшь против себя
✔ станет проще принимать решения
✔ уйдёт ощущение «со мной что-то не так»";

/// The closing block with links to the full report and consultations.
pub fn final_block(consultation_url: &str) -> String {
    format!(
        "Ты получил базовую расшифровку твоих ключевых Аватаров.
Этого достаточно, чтобы увидеть главное.

Если ты чувствуешь, что:
• хочешь глубже понять себя
• связать характер, таланты и деньги
• получить чёткий план действий
• разобрать конкретную ситуацию

👉 у тебя есть два варианта:

📋 Получить полный аватар личности (глубокий разбор всех точек + рекомендации)
👉 {consultation_url}

📞 Записаться на личную консультацию (разбор твоей ситуации + стратегия на 3–6 месяцев)
👉 {consultation_url}

Я рядом, чтобы помочь тебе понять себя, а не переделывать."
    )
}

pub fn report_footer(consultation_url: &str) -> String {
    let site = consultation_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("Метод «Аватар личности». Полный разбор: {site}")
}

/// Which part of the chart a section of the report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Character,
    Comfort,
    Talents,
    Money,
    Lessons,
}

impl Block {
    pub fn title(self) -> &'static str {
        match self {
            Block::Character => "Характер",
            Block::Comfort => "Зона комфорта",
            Block::Talents => "Таланты",
            Block::Money => "Деньги",
            Block::Lessons => "Уроки в падении",
        }
    }

    /// Dative form used in "Рекомендации по ...".
    pub fn dative(self) -> &'static str {
        match self {
            Block::Character => "характеру",
            Block::Comfort => "зоне комфорта",
            Block::Talents => "талантам",
            Block::Money => "деньгам",
            Block::Lessons => "урокам",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Block::Character => "🧬",
            Block::Comfort => "🛋",
            Block::Talents => "✨",
            Block::Money => "💰",
            Block::Lessons => "📚",
        }
    }

    /// Intro paragraph for the block, worded for the reader's gender.
    pub fn intro(self, gender: Gender) -> &'static str {
        match (self, gender) {
            (Block::Character, Gender::Male) => "Аватар характера показывает, каким ты родился: твою природу, реакции и то, как ты проявляешься в мире.",
            (Block::Character, Gender::Female) => "Аватар характера показывает, какой ты родилась: твою природу, реакции и то, как ты проявляешься в мире.",
            (Block::Comfort, Gender::Male) => "Зона комфорта показывает, где ты чувствуешь себя уверенно и спокойно, и куда возвращаешься, когда устал.",
            (Block::Comfort, Gender::Female) => "Зона комфорта показывает, где ты чувствуешь себя уверенно и спокойно, и куда возвращаешься, когда устала.",
            (Block::Talents, Gender::Male) => "Аватар талантов показывает, что даётся тебе легко и в чём ты можешь стать мастером.",
            (Block::Talents, Gender::Female) => "Аватар талантов показывает, что даётся тебе легко и в чём ты можешь стать мастерицей.",
            (Block::Money, _) => "Денежный аватар показывает, через какие действия и состояния к тебе приходят деньги.",
            (Block::Lessons, _) => "Уроки в падении показывают, куда ты уходишь в стрессе и что важно проработать, чтобы не терять силу.",
        }
    }
}
