//! 有理数类型, 用于时间基与帧率.

use std::fmt;

/// 有理数, 由分子和分母组成
///
/// 时间基 1/90000 表示 90kHz 时钟, 帧率 30000/1001 表示 29.97fps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    /// 创建新的有理数
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 未定义 (分母为 0)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    /// 判断是否有效 (分母不为 0)
    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 转换为 f64, 分母为 0 时返回 `f64::NAN`
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        f64::from(self.num) / f64::from(self.den)
    }

    /// 求倒数
    pub const fn invert(self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self { num, den }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_to_f64() {
        assert!((Rational::new(1, 4).to_f64() - 0.25).abs() < f64::EPSILON);
        assert!(Rational::UNDEFINED.to_f64().is_nan());
    }

    #[test]
    fn test_rational_invert() {
        assert_eq!(Rational::new(1, 25).invert(), Rational::new(25, 1));
    }
}
