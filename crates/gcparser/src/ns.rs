pub mod parsers {
    //! Names of the built-in parsers

    pub const MY_FINDS: &str = "myFinds";
    pub const CACHE: &str = "cache";
    pub const EDIT_PROFILE: &str = "editProfile";
}

pub mod args {
    //! Argument keys understood by the built-in parsers

    pub const GUID: &str = "guid"; // cache
    pub const WAYPOINT: &str = "waypoint"; // cache
    pub const LOGS: &str = "logs"; // cache, flag
    pub const DETAILS: &str = "details"; // editProfile
}

pub mod urls {
    //! Site paths, relative to the fetcher's base url

    pub const CACHE_DETAILS: &str = "/seek/cache_details.aspx?pf=y&numlogs=&decrypt=y";
    pub const MY_LOGS: &str = "/my/logs.aspx?s=1";
    pub const EDIT_PROFILE: &str = "/account/editprofiledetails.aspx";
}

pub mod fields {
    //! ASP.NET form fields posted back to the site

    pub const PROFILE_DETAILS: &str = "ctl00$ContentBody$uxProfileDetails";
    pub const PROFILE_SAVE: &str = "ctl00$ContentBody$uxSave";
}
