use jsonpath_get::{get, get_with, Options, PathErrorType, Query};
use serde_json::json;

mod parse_errors {
    use super::*;

    #[test]
    #[should_panic(expected = "expected '$', found 'f'")]
    fn missing_root() {
        Query::parse("foo.bar").unwrap();
    }

    #[test]
    #[should_panic(expected = "unclosed bracketed selection")]
    fn unclosed_bracketed_selection() {
        Query::parse("$.foo[0").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty bracketed selection")]
    fn empty_bracketed_selection() {
        Query::parse("$.foo[]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected shorthand selector")]
    fn trailing_dot() {
        Query::parse("$.foo.").unwrap();
    }

    #[test]
    #[should_panic(expected = "slice step must be a positive integer")]
    fn negative_slice_step() {
        Query::parse("$.xs[::-1]").unwrap();
    }

    #[test]
    #[should_panic(expected = "slice step must be a positive integer")]
    fn zero_slice_step() {
        Query::parse("$.xs[0:4:0]").unwrap();
    }

    #[test]
    #[should_panic(expected = "invalid index '01'")]
    fn leading_zero_index() {
        Query::parse("$.xs[01]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected end of query after '~'")]
    fn keys_mid_path() {
        Query::parse("$.foo~.bar").unwrap();
    }

    #[test]
    #[should_panic(expected = "unbalanced parentheses")]
    fn unclosed_script_expression() {
        Query::parse("$.xs[(@.length").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected expression token ']'")]
    fn unbalanced_script_parens() {
        Query::parse("$.xs[((@.length-1)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '?('")]
    fn bare_question_mark() {
        Query::parse("$.xs[?]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unknown current-node token")]
    fn unknown_current_node_token() {
        Query::parse("$.xs[?(@parent)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unknown keyword 'nil'")]
    fn unknown_keyword() {
        Query::parse("$.xs[?(@ == nil)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '==', found '='")]
    fn single_equals() {
        Query::parse("$.xs[?(@.a = 1)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected expression token ')'")]
    fn empty_filter_expression() {
        Query::parse("$.xs[?()]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected a comma or closing bracket")]
    fn missing_comma_between_selectors() {
        Query::parse("$.xs[0 1]").unwrap();
    }
}

mod evaluation_errors {
    use super::*;

    #[test]
    #[should_panic(expected = "script index must evaluate to an integer")]
    fn fractional_script_index() {
        let doc = json!({"xs": [1, 2, 3]});
        get(&doc, "$.xs[(@.length/2)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "script index must evaluate to an integer")]
    fn boolean_script_index() {
        let doc = json!({"xs": [1, 2, 3]});
        get(&doc, "$.xs[(true)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "arithmetic on a non-numeric value")]
    fn arithmetic_on_a_missing_member() {
        let doc = json!({"xs": {"a": 1}});
        get(&doc, "$.xs[(@.length-1)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "division by zero")]
    fn division_by_zero() {
        let doc = json!({"xs": [1]});
        get(&doc, "$.xs[(1/0)]").unwrap();
    }
}

mod disabled_evaluation {
    use super::*;

    #[test]
    fn filters_fail_when_eval_is_disabled() {
        let doc = json!({"xs": [1, 2, 3]});
        let err = get_with(&doc, "$.xs[?(@>2)]", &Options { eval: false }).unwrap_err();
        assert!(matches!(err.kind, PathErrorType::EvaluationDisabled));
    }

    #[test]
    fn scripts_fail_when_eval_is_disabled() {
        let doc = json!({"xs": [1, 2, 3]});
        let err = get_with(&doc, "$.xs[(@.length-1)]", &Options { eval: false }).unwrap_err();
        assert!(matches!(err.kind, PathErrorType::EvaluationDisabled));
    }

    #[test]
    fn disabled_eval_fails_even_without_matches() {
        // a missing parent does not mask the misconfiguration
        let doc = json!({"xs": [1, 2, 3]});
        let err = get_with(&doc, "$.ys[?(@>2)]", &Options { eval: false }).unwrap_err();
        assert!(matches!(err.kind, PathErrorType::EvaluationDisabled));
    }
}
