use tantivy::schema::{IndexRecordOption, NumericOptions, Schema, TextFieldIndexing, TextOptions};
use tantivy::tokenizer::{LowerCaser, RegexTokenizer, TextAnalyzer, TokenStream};
use tantivy::Index;

pub const TERMS_ANALYZER: &str = "passage_terms";
pub const POSITION_FIELD: &str = "position";
pub const TEXT_FIELD: &str = "text";

/// Maximal runs of Hangul syllables, Latin letters or digits. Anything else
/// (punctuation, whitespace, other scripts) separates tokens.
pub const TOKEN_PATTERN: &str = r"[가-힣]+|[A-Za-z]+|[0-9]+";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _position_field = schema_builder.add_u64_field(POSITION_FIELD, NumericOptions::default().set_stored());
	// Field lengths are kept as tantivy's lossy one-byte fieldnorms.
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TERMS_ANALYZER).set_index_option(IndexRecordOption::WithFreqs);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _text_field = schema_builder.add_text_field(TEXT_FIELD, text_options);
	schema_builder.build()
}

/// Regex tokenizer + lower-casing. No stemming, no stop words.
pub fn build_analyzer() -> tantivy::Result<TextAnalyzer> {
	let tokenizer = RegexTokenizer::new(TOKEN_PATTERN)?;
	Ok(TextAnalyzer::builder(tokenizer).filter(LowerCaser).build())
}

pub fn register_analyzer(index: &Index, analyzer: &TextAnalyzer) {
	index.tokenizers().register(TERMS_ANALYZER, analyzer.clone());
}

/// Run `text` through `analyzer`, collecting the token texts in order.
/// The text is lower-cased before runs are extracted, so characters that
/// only become ASCII letters when lower-cased (e.g. U+212A) still match.
pub fn analyze(analyzer: &TextAnalyzer, text: &str) -> Vec<String> {
	let lowered = text.to_lowercase();
	let mut analyzer = analyzer.clone();
	let mut stream = analyzer.token_stream(&lowered);
	let mut tokens = Vec::new();
	while stream.advance() { tokens.push(stream.token().text.clone()); }
	tokens
}

/// Tokenize with the default analyzer.
pub fn tokenize(text: &str) -> Vec<String> {
	match build_analyzer() {
		Ok(analyzer) => analyze(&analyzer, text),
		Err(e) => {
			tracing::error!(error = %e, "token pattern failed to compile");
			Vec::new()
		}
	}
}
