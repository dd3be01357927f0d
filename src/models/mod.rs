pub mod booking;
pub mod movie;
pub mod show;
pub mod theater;
pub mod user;

pub use booking::{Booking, BookingDetails, BookingInsertError, NewBooking};
pub use movie::{Movie, MovieInput};
pub use show::{Show, ShowDetails, ShowFilter, ShowInput};
pub use theater::{Theater, TheaterInput};
pub use user::User;
