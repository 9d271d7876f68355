use crate::model::{CombinedSignal, Direction, Timeframe, TimeframeSignal};

/// Merges per-timeframe signals into one weighted signal. Deterministic given
/// its inputs; input order does not matter, the fixed 5m,15m,30m,1h order is
/// applied here.
pub fn combine(signals: &[(Timeframe, TimeframeSignal)]) -> CombinedSignal {
    let mut up_score = 0.0;
    let mut down_score = 0.0;
    let mut neutral_score = 0.0;
    let mut total_confidence = 0.0;
    let mut weight_sum = 0.0;
    let mut reasons = Vec::new();

    for timeframe in Timeframe::ALL {
        let Some((_, signal)) = signals.iter().find(|(t, _)| *t == timeframe) else {
            continue;
        };
        let weight = timeframe.weight();
        let contribution = weight * signal.confidence as f64;

        match signal.direction {
            Direction::Up => up_score += contribution,
            Direction::Down => down_score += contribution,
            Direction::Neutral => neutral_score += contribution,
        }
        total_confidence += contribution;
        weight_sum += weight;
        reasons.push(format!("{}: {}", timeframe.label(), signal.rationale));
    }

    // Strictly greatest bucket wins; any tie (including all-zero) is NEUTRAL.
    let direction = if up_score > down_score && up_score > neutral_score {
        Direction::Up
    } else if down_score > up_score && down_score > neutral_score {
        Direction::Down
    } else {
        Direction::Neutral
    };

    let confidence = if weight_sum > 0.0 {
        (total_confidence / weight_sum).round() as u8
    } else {
        0
    };

    CombinedSignal {
        direction,
        confidence,
        rationale: reasons.join("; "),
    }
}
