//! crates/avatar_core/src/report.rs
//!
//! Assembles a calculation into an ordered, renderer-neutral report. Both the
//! chat renderer and the document renderer consume this structure.

use crate::birth_date::BirthDate;
use crate::domain::{AvatarPoint, AvatarResult, Gender};
use crate::texts::{self, Block};

/// One block of the report, describing a single avatar point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub block: Block,
    pub index: u32,
    pub intro: &'static str,
    pub avatar_title: String,
    pub image: Option<String>,
    pub description: String,
    /// `None` for blocks that carry no advice. An empty list still gets a heading.
    pub recommendations: Option<Vec<String>>,
}

impl ReportSection {
    fn new(block: Block, point: &AvatarPoint, gender: Gender) -> Self {
        let content = &point.content;
        let description = match block {
            Block::Character => &content.character,
            Block::Talents => &content.talents,
            Block::Money => &content.money,
            Block::Comfort | Block::Lessons => &content.lessons,
        };
        let recommendations = match block {
            Block::Character | Block::Comfort => Some(content.recommendations.clone()),
            Block::Talents | Block::Money | Block::Lessons => None,
        };
        Self {
            block,
            index: point.index,
            intro: block.intro(gender),
            avatar_title: content.title.clone(),
            image: content.image.clone(),
            description: description.clone(),
            recommendations,
        }
    }

    pub fn heading(&self) -> &'static str {
        self.block.title()
    }

    pub fn recommendations_heading(&self) -> String {
        format!("Рекомендации по {}", self.block.dative())
    }
}

/// A complete report for one birth date and gender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarReport {
    pub birth_date: BirthDate,
    pub gender: Gender,
    pub sections: Vec<ReportSection>,
    pub footer: String,
}

impl AvatarReport {
    /// Orders the points the way the report presents them: character, comfort
    /// zone, talents, money, lessons.
    pub fn build(birth_date: BirthDate, result: &AvatarResult, consultation_url: &str) -> Self {
        let gender = result.gender;
        let sections = vec![
            ReportSection::new(Block::Character, &result.a, gender),
            ReportSection::new(Block::Comfort, &result.d, gender),
            ReportSection::new(Block::Talents, &result.b, gender),
            ReportSection::new(Block::Money, &result.v, gender),
            ReportSection::new(Block::Lessons, &result.g, gender),
        ];
        Self {
            birth_date,
            gender,
            sections,
            footer: texts::report_footer(consultation_url),
        }
    }

    pub fn heading(&self) -> &'static str {
        texts::REPORT_HEADING
    }

    pub fn date_line(&self) -> String {
        format!("Дата рождения: {}", self.birth_date.formatted())
    }

    /// `avatar-report-DD-MM-YYYY.pdf`
    pub fn filename(&self) -> String {
        format!(
            "avatar-report-{}.pdf",
            self.birth_date.formatted().replace('.', "-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::AvatarCalculator;
    use crate::content::ContentTable;
    use std::sync::Arc;

    fn report(gender: Gender) -> AvatarReport {
        let calc = AvatarCalculator::new(Arc::new(ContentTable::embedded().unwrap()));
        let result = calc.calculate(5, 3, 1990, gender).unwrap();
        let date = BirthDate { day: 5, month: 3, year: 1990 };
        AvatarReport::build(date, &result, "https://avalik-avatar.ru")
    }

    #[test]
    fn sections_follow_report_order() {
        let report = report(Gender::Female);
        let blocks: Vec<Block> = report.sections.iter().map(|s| s.block).collect();
        assert_eq!(
            blocks,
            vec![
                Block::Character,
                Block::Comfort,
                Block::Talents,
                Block::Money,
                Block::Lessons
            ]
        );
        // 05.03.1990: A = 5, B = 3, V = 19, G = 27 → 9, D = 36 → 9.
        let indices: Vec<u32> = report.sections.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![5, 9, 3, 19, 9]);
        assert_eq!(report.sections[0].avatar_title, "Учительница");
    }

    #[test]
    fn names_the_file_after_the_date() {
        let report = report(Gender::Male);
        assert_eq!(report.filename(), "avatar-report-05-03-1990.pdf");
        assert_eq!(report.date_line(), "Дата рождения: 05.03.1990");
        assert_eq!(
            report.sections[1].recommendations_heading(),
            "Рекомендации по зоне комфорта"
        );
    }

    #[test]
    fn each_block_reads_its_own_text() {
        let calc = AvatarCalculator::new(Arc::new(ContentTable::embedded().unwrap()));
        // 03.03.1990: A = 3 and B = 3 share an avatar.
        let result = calc.calculate(3, 3, 1990, Gender::Male).unwrap();
        let report = AvatarReport::build(
            BirthDate { day: 3, month: 3, year: 1990 },
            &result,
            "https://avalik-avatar.ru",
        );
        let character = &report.sections[0];
        let talents = &report.sections[2];
        assert_eq!((character.index, talents.index), (3, 3));
        assert_eq!(character.description, result.a.content.character);
        assert_eq!(talents.description, result.b.content.talents);
        assert_ne!(character.description, talents.description);

        assert_eq!(report.sections[1].description, result.d.content.lessons);
        assert_eq!(report.sections[3].description, result.v.content.money);
        assert_eq!(report.sections[4].description, result.g.content.lessons);
    }

    #[test]
    fn advice_follows_character_and_comfort_only() {
        let report = report(Gender::Male);
        let with_advice: Vec<Block> = report
            .sections
            .iter()
            .filter(|s| s.recommendations.is_some())
            .map(|s| s.block)
            .collect();
        assert_eq!(with_advice, vec![Block::Character, Block::Comfort]);
        assert!(!report.sections[0].recommendations.as_ref().unwrap().is_empty());
    }
}
