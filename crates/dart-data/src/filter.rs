//! 임원 소유상황보고서 제목 필터.

use dart_core::{Filing, FilterSettings};

/// 공시 제목 키워드 필터.
///
/// 정확한 부분 문자열 일치만 사용합니다. 제공처의 구두점 표기가 바뀌면
/// 누락될 수 있으므로 알려진 변형을 키워드 목록에 모두 나열해야 합니다.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    keywords: Vec<String>,
}

impl TitleFilter {
    /// 키워드 목록으로 필터를 생성합니다. 빈 키워드는 무시합니다.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.is_empty())
                .collect(),
        }
    }

    /// 설정에서 필터를 생성합니다.
    pub fn from_settings(settings: &FilterSettings) -> Self {
        Self::new(settings.title_keywords.iter().cloned())
    }

    /// 제목이 키워드 중 하나를 포함하는지 확인합니다.
    pub fn matches(&self, title: &str) -> bool {
        self.keywords.iter().any(|k| title.contains(k.as_str()))
    }

    /// 공시 제목이 일치하는지 확인합니다.
    pub fn matches_filing(&self, filing: &Filing) -> bool {
        self.matches(&filing.title)
    }

    /// 일치하는 공시만 남깁니다.
    pub fn apply(&self, filings: Vec<Filing>) -> Vec<Filing> {
        filings
            .into_iter()
            .filter(|f| self.matches_filing(f))
            .collect()
    }
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self::from_settings(&FilterSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_matches_punctuation_variants() {
        let filter = TitleFilter::default();
        assert!(filter.matches("임원ㆍ주요주주특정증권등소유상황보고서"));
        assert!(filter.matches("임원·주요주주특정증권등소유상황보고서"));
        assert!(filter.matches("[기재정정]임원ㆍ주요주주특정증권등소유상황보고서"));
    }

    #[test]
    fn test_rejects_unrelated_titles() {
        let filter = TitleFilter::default();
        assert!(!filter.matches("주요사항보고서(자기주식취득결정)"));
        assert!(!filter.matches("최대주주등소유주식변동신고서"));
        assert!(!filter.matches(""));
    }

    #[test]
    fn test_empty_keywords_are_ignored() {
        let filter = TitleFilter::new(vec!["", "주식등의대량보유상황보고서"]);
        assert!(filter.matches("주식등의대량보유상황보고서"));
        assert!(!filter.matches("아무 제목"));
    }

    proptest! {
        #[test]
        fn prop_non_matching_titles_are_rejected(title in "\\PC{0,40}") {
            let filter = TitleFilter::default();
            let keywords = FilterSettings::default().title_keywords;
            prop_assume!(!keywords.iter().any(|k| title.contains(k.as_str())));
            prop_assert!(!filter.matches(&title));
        }

        #[test]
        fn prop_keyword_anywhere_matches(prefix in "\\PC{0,10}", suffix in "\\PC{0,10}") {
            let filter = TitleFilter::default();
            let title = format!("{prefix}임원ㆍ주요주주특정증권등소유상황보고서{suffix}");
            prop_assert!(filter.matches(&title));
        }
    }
}
