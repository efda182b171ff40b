//! BM25 similarity.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25 {
    fn default() -> Self {
        Bm25 { k1: 1.2, b: 0.75 }
    }
}

impl Bm25 {
    pub fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        let df = doc_freq as f32;
        let n = doc_count as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    pub fn score(
        &self,
        term_freq: u32,
        field_length: u32,
        average_length: f32,
        doc_freq: u64,
        doc_count: u64,
    ) -> f32 {
        let tf = term_freq as f32;
        let length_ratio = if average_length > 0.0 {
            field_length as f32 / average_length
        } else {
            1.0
        };
        let norm = self.k1 * (1.0 - self.b + self.b * length_ratio);
        self.idf(doc_freq, doc_count) * (tf * (self.k1 + 1.0)) / (tf + norm)
    }
}
