//! Default scan universe: liquid, high-beta US equities.

pub const DEFAULT_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "AMD", "AVGO", "NFLX",
    "CRM", "ORCL", "ADBE", "INTC", "QCOM", "TXN", "MU", "AMAT", "LRCX", "KLAC",
    "NOW", "SNOW", "PLTR", "CRWD", "ZS", "PANW", "NET", "DDOG", "MDB", "OKTA",
    "SHOP", "SQ", "PYPL", "COIN", "HOOD", "SOFI", "AFRM", "UPST", "NU", "RBLX",
    "UBER", "LYFT", "DASH", "ABNB", "BKNG", "EXPE", "MAR", "DAL", "UAL", "AAL",
    "JPM", "BAC", "WFC", "GS", "MS", "C", "SCHW", "V", "MA", "AXP",
    "XOM", "CVX", "COP", "SLB", "OXY", "DVN", "FANG", "HAL", "MPC", "VLO",
    "JNJ", "PFE", "MRK", "ABBV", "LLY", "BMY", "AMGN", "GILD", "BIIB", "REGN",
    "MRNA", "BNTX", "VRTX", "ISRG", "UNH", "CVS", "CI", "HUM", "TMO", "DHR",
    "WMT", "TGT", "COST", "HD", "LOW", "NKE", "SBUX", "MCD", "DIS", "CMCSA",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_universe_size_and_uniqueness() {
        assert_eq!(DEFAULT_UNIVERSE.len(), 100);
        let unique: HashSet<_> = DEFAULT_UNIVERSE.iter().collect();
        assert_eq!(unique.len(), DEFAULT_UNIVERSE.len());
    }
}
