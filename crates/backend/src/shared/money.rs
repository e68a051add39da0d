/// Round a money amount to cents
pub fn redondear(importe: f64) -> f64 {
    (importe * 100.0).round() / 100.0
}

/// Gross amount from a net amount and a VAT rate in percent. The stored
/// importe_total is always derived through this function, never accepted
/// from the caller.
pub fn importe_total(neto: f64, iva_pct: f64) -> f64 {
    redondear(neto * (1.0 + iva_pct / 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importe_total() {
        assert_eq!(importe_total(1000.0, 21.0), 1210.0);
        assert_eq!(importe_total(100.0, 10.0), 110.0);
        assert_eq!(importe_total(250.0, 0.0), 250.0);
    }

    #[test]
    fn test_importe_total_rounds_to_cents() {
        assert_eq!(importe_total(33.33, 21.0), 40.33);
        assert_eq!(importe_total(0.01, 21.0), 0.01);
    }

    #[test]
    fn test_redondear() {
        assert_eq!(redondear(1.0049), 1.0);
        assert_eq!(redondear(10.004), 10.0);
        assert_eq!(redondear(10.006), 10.01);
    }
}
